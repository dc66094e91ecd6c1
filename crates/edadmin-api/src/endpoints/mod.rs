// Resource-specific endpoints layered on top of the generic collection CRUD.

mod broadcasts;
mod companies;
mod publishing;
mod webhooks;

pub use broadcasts::BroadcastQuery;
pub use companies::CompanyAction;
pub use publishing::PublishAction;
