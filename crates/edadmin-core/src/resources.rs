// ── Resource catalog ──
//
// Every editable screen of the admin console, with its REST collection and
// a ready-made `Binding` carrying the loaders and extras the screen needs.

use edadmin_api::{ApiClient, is_admin_endpoint};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::binder::{Binding, Entity, SaveRequest};
use crate::error::CoreError;
use crate::location::{ID_PARAM, Location, Params};

type ExtraLoader = Box<dyn Fn(Params) -> BoxFuture<'static, Result<Value, CoreError>> + Send + Sync>;

const NONE_AVAILABLE: &str = "None Available";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    Broadcasts,
    Lists,
    Segments,
    #[strum(to_string = "supplists", serialize = "supp-lists")]
    SuppLists,
    Policies,
    Routes,
    #[strum(to_string = "domaingroups", serialize = "domain-groups")]
    DomainGroups,
    #[strum(to_string = "servers", serialize = "sinks")]
    Servers,
    Warmups,
    Throttles,
    Dkim,
    Webhooks,
    Templates,
    Customers,
    Users,
    Frontends,
    #[strum(to_string = "smtprelays", serialize = "smtp-relays")]
    SmtpRelays,
}

impl ResourceKind {
    /// REST collection under `/api/`.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Broadcasts => "broadcasts",
            Self::Lists => "lists",
            Self::Segments => "segments",
            Self::SuppLists => "supplists",
            Self::Policies => "policies",
            Self::Routes => "routes",
            Self::DomainGroups => "domaingroups",
            Self::Servers => "sinks",
            Self::Warmups => "warmups",
            Self::Throttles => "domainthrottles",
            Self::Dkim => "dkimentries",
            Self::Webhooks => "resthooks",
            Self::Templates => "transactional/templates",
            Self::Customers => "companies",
            Self::Users => "users",
            Self::Frontends => "frontends",
            Self::SmtpRelays => "smtprelays",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Self::Broadcasts => "broadcast",
            Self::Lists => "contact list",
            Self::Segments => "segment",
            Self::SuppLists => "suppression list",
            Self::Policies => "policy",
            Self::Routes => "route",
            Self::DomainGroups => "domain group",
            Self::Servers => "server",
            Self::Warmups => "warmup",
            Self::Throttles => "domain throttle",
            Self::Dkim => "DKIM settings",
            Self::Webhooks => "webhook",
            Self::Templates => "transactional template",
            Self::Customers => "customer",
            Self::Users => "user",
            Self::Frontends => "frontend",
            Self::SmtpRelays => "SMTP relay",
        }
    }

    /// Admin-level collections ignore customer impersonation.
    pub fn is_admin(self) -> bool {
        is_admin_endpoint(&format!("/api/{}", self.collection()))
    }

    /// One document per account, edited without an id.
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Dkim)
    }

    /// Whether the screen can create records. Suppression lists come from
    /// uploads; policies and templates have dedicated creation flows.
    pub fn can_create(self) -> bool {
        !matches!(
            self,
            Self::Dkim | Self::SuppLists | Self::Policies | Self::Templates
        )
    }

    /// Kinds with a draft/published lifecycle.
    pub fn publishable(self) -> bool {
        matches!(self, Self::Policies | Self::Routes | Self::Warmups)
    }

    /// Edit screen for `id` (`None` for collection screens and singletons).
    pub fn location(self, id: Option<&str>) -> Location {
        let loc = Location::new(format!("/{self}/edit"));
        match id {
            Some(id) => loc.with_param(ID_PARAM, id),
            None => loc,
        }
    }

    /// Blank record for create-mode.
    pub fn initial(self) -> Value {
        match self {
            Self::Broadcasts => json!({
                "name": "", "fromname": "", "returnpath": "", "fromemail": "",
                "replyto": "", "subject": "", "preheader": "", "parts": [],
                "bodyStyle": {"version": 3}, "lists": [], "segments": [],
                "supplists": [], "tags": [], "supptags": [], "suppsegs": [],
                "funnel": "", "disableopens": false,
            }),
            Self::Lists => json!({"name": "", "count": 0}),
            Self::Segments => json!({
                "name": "", "parts": [], "operator": "and", "subset": false,
                "subsetsort": "", "subsettype": "percent", "subsetpct": 10,
                "subsetnum": 2000,
            }),
            Self::SuppLists => json!({"name": ""}),
            Self::Webhooks => json!({"name": "", "target_url": "", "event": "open_click"}),
            Self::Routes => json!({
                "name": "",
                "usedefault": false,
                "rules": [{
                    "default": true,
                    "domaingroup": "",
                    "splits": [{"policy": "", "pct": 100}],
                }],
            }),
            Self::DomainGroups => json!({"name": "", "domains": ""}),
            Self::Servers => json!({"name": "", "url": "", "accesskey": "", "ipdata": []}),
            Self::Warmups => json!({
                "name": "", "sink": null, "ips": "", "ipsset": false,
                "excludeips": "", "domains": "*", "excludedomains": "",
                "priority": "med", "dailylimit": 200, "limitcount": 14,
                "rampfactor": 100, "threshold": 80, "thresholddays": 1,
                "dayoverrides": {}, "countlimit": 14, "afterlimit": "warmup",
            }),
            Self::Throttles => json!({
                "route": "", "domains": "*", "minlimit": null,
                "hourlimit": null, "daylimit": null, "active": true,
            }),
            Self::Dkim | Self::Policies | Self::Templates => json!({}),
            Self::Customers => json!({
                "name": "", "frontend": "", "routes": [],
                "minlimit": 999_999_999, "hourlimit": 999_999_999,
                "daylimit": 999_999_999, "monthlimit": 999_999_999,
                "exampletemplate": false, "price": null, "period": "monthly",
                "credits": null, "overageprice": null, "overagecredits": null,
                "minlimitpostupgrade": 999_999_999, "hourlimitpostupgrade": 999_999_999,
                "daylimitpostupgrade": 999_999_999, "monthlimitpostupgrade": 999_999_999,
                "skip_list_validation": true,
            }),
            Self::Users => json!({
                "username": "", "fullname": "", "disabled": false,
                "password1": "", "password2": "", "nodataexport": false,
            }),
            Self::Frontends => json!({
                "name": "", "welcometext": "Welcome", "bodydomain": "",
                "customcss": "", "usedkim": true, "bouncerate": 3.0,
                "complaintrate": 0.2,
                "domainrates": [{"domain": "", "bouncerate": 3.0, "complaintrate": 0.2}],
                "bouncethreshold": 99, "unsubthreshold": 99,
                "complaintthreshold": 99, "fromencoding": "none",
                "subjectencoding": "none", "invitename": "Welcome",
                "inviteemail": "invite@domain.com", "useapprove": false,
                "usetrial": false, "trialdays": 10,
            }),
            Self::SmtpRelays => json!({
                "name": "", "hostname": "", "ehlohostname": "", "useauth": false,
                "username": "", "password": "", "ssltype": "none", "port": 25,
                "msgsperconn": null, "headers": "", "linkdomain": "",
            }),
        }
    }

    /// Columns shown by list views.
    pub fn list_columns(self) -> &'static [&'static str] {
        match self {
            Self::Broadcasts => &["id", "name", "subject", "sent_at", "count", "delivered"],
            Self::Lists => &["id", "name", "count", "unsubscribed", "bounced"],
            Self::Segments => &["id", "name", "count"],
            Self::Policies | Self::Routes => &["id", "name", "dirty"],
            Self::DomainGroups => &["id", "name", "domaincount"],
            Self::Servers => &["id", "name", "url"],
            Self::Warmups => &["id", "name", "sink", "dailylimit", "dirty"],
            Self::Throttles => &["id", "route", "domains", "daylimit", "active"],
            Self::Dkim => &["domain", "selector"],
            Self::Webhooks => &["id", "name", "event", "target_url"],
            Self::Customers => &["id", "name", "frontend", "paid", "paused", "banned"],
            Self::Users => &["id", "username", "fullname", "disabled"],
            Self::Frontends | Self::SuppLists | Self::Templates => &["id", "name"],
            Self::SmtpRelays => &["id", "name", "hostname", "port"],
        }
    }

    /// Columns the list search matches against.
    pub fn search_columns(self) -> &'static [&'static str] {
        match self {
            Self::Broadcasts => &["name", "subject"],
            Self::Throttles => &["route", "domains"],
            Self::Dkim => &["domain"],
            Self::Webhooks => &["name", "target_url"],
            Self::Users => &["username", "fullname"],
            _ => &["name"],
        }
    }

    // ── Bindings ─────────────────────────────────────────────────────

    /// Untyped binding over raw JSON, starting from [`initial`](Self::initial).
    pub fn binding(self, client: &ApiClient) -> Binding<Value> {
        self.typed_binding(client, self.initial())
    }

    /// Binding over a typed model.
    pub fn typed_binding<T: Entity>(self, client: &ApiClient, initial: T) -> Binding<T> {
        let collection = self.collection();

        let c = client.clone();
        let mut binding = Binding::new(initial)
            .get(move |p: Params| {
                let client = c.clone();
                async move {
                    let loaded = match p.id.existing() {
                        Some(id) => client.fetch(collection, id).await?,
                        None => client.get(collection).await?,
                    };
                    Ok(loaded)
                }
            })
            .patch({
                let c = client.clone();
                move |req: SaveRequest| {
                    let client = c.clone();
                    async move {
                        let saved = match req.id.existing() {
                            Some(id) => client.update(collection, id, &req.data).await?,
                            None => client.patch_value(collection, &req.data).await?,
                        };
                        Ok(saved)
                    }
                }
            });

        if self.can_create() {
            let c = client.clone();
            binding = binding.post(move |req: SaveRequest| {
                let client = c.clone();
                async move { Ok(client.create(collection, &req.data).await?) }
            });
        }

        self.with_extras(binding, client)
    }

    fn with_extras<T: Entity>(self, binding: Binding<T>, client: &ApiClient) -> Binding<T> {
        match self {
            Self::Broadcasts => binding
                .extra("lists", sorted(client, "lists"))
                .extra("segments", sorted(client, "segments")),
            Self::Segments => binding
                .extra("lists", options(client, "lists", false))
                .extra("segments", options(client, "segments", true))
                .extra("campaigns", recent_broadcasts(client))
                .extra("tags", raw(client, "recenttags"))
                .extra("countries", raw(client, "countries"))
                .extra("regions", raw(client, "regions"))
                .extra("allfields", raw(client, "allfields")),
            Self::Policies => binding.extra("sinks", sorted(client, "sinks")),
            Self::Routes => binding
                .extra("domaingroups", sorted(client, "domaingroups"))
                .extra("policies", sorted(client, "routepolicies")),
            Self::Warmups => binding
                .extra("sinks", sorted(client, "sinks"))
                .extra("override", warmup_override(client))
                .extra_merge("sink", "sinks"),
            Self::Throttles => binding
                .extra("routes", sorted(client, "userroutes"))
                .extra_merge("route", "routes"),
            Self::Templates => binding.extra("routes", sorted(client, "userroutes")),
            Self::Customers => binding
                .extra("frontends", sorted(client, "frontends"))
                .extra("routes", published_routes(client))
                .extra("credits", credits(client))
                .extra_merge("frontend", "frontends"),
            Self::Frontends => binding
                .extra("mailgun", raw(client, "mailgun"))
                .extra("ses", raw(client, "ses"))
                .extra("sparkpost", raw(client, "sparkpost")),
            Self::Lists
            | Self::SuppLists
            | Self::DomainGroups
            | Self::Servers
            | Self::Dkim
            | Self::Webhooks
            | Self::Users
            | Self::SmtpRelays => binding,
        }
    }
}

// ── Extra loaders ────────────────────────────────────────────────────

fn name_key(item: &Value) -> String {
    item.get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

/// The collection as returned.
fn raw(client: &ApiClient, path: &'static str) -> ExtraLoader {
    let client = client.clone();
    Box::new(move |_| {
        let client = client.clone();
        async move { Ok(client.get::<Value>(path).await?) }.boxed()
    })
}

/// The collection sorted by name, ignoring case.
fn sorted(client: &ApiClient, path: &'static str) -> ExtraLoader {
    let client = client.clone();
    Box::new(move |_| {
        let client = client.clone();
        async move {
            let mut items: Vec<Value> = client.list(path, &[]).await?;
            items.sort_by_cached_key(name_key);
            Ok(Value::Array(items))
        }
        .boxed()
    })
}

/// `{id, text}` choices for a picker. With `exclude_self`, the record being
/// edited is left out.
fn options(client: &ApiClient, path: &'static str, exclude_self: bool) -> ExtraLoader {
    let client = client.clone();
    Box::new(move |p: Params| {
        let client = client.clone();
        async move {
            let mut items: Vec<Value> = client.list(path, &[]).await?;
            if let (true, Some(own)) = (exclude_self, p.id.existing()) {
                items.retain(|item| item.get("id").and_then(Value::as_str) != Some(own));
            }
            items.sort_by_cached_key(name_key);

            let mut choices: Vec<Value> = items
                .iter()
                .map(|item| json!({"id": item["id"], "text": item["name"]}))
                .collect();
            if choices.is_empty() {
                choices.push(json!({"id": "", "text": NONE_AVAILABLE}));
            }
            Ok(Value::Array(choices))
        }
        .boxed()
    })
}

fn published_routes(client: &ApiClient) -> ExtraLoader {
    let client = client.clone();
    Box::new(move |_| {
        let client = client.clone();
        async move {
            let mut routes: Vec<Value> = client.list("routes", &[]).await?;
            routes.retain(|r| r.get("published").and_then(Value::as_bool).unwrap_or(false));
            Ok(Value::Array(routes))
        }
        .boxed()
    })
}

/// Broadcasts that recently targeted the segment, as picker choices.
fn recent_broadcasts(client: &ApiClient) -> ExtraLoader {
    let client = client.clone();
    Box::new(move |p: Params| {
        let client = client.clone();
        async move {
            let segid = p.id.to_string();
            let items: Vec<Value> = client
                .get_with_params("recentbroadcasts", &[("segid", segid)])
                .await?;
            let choices = items
                .iter()
                .map(|c| {
                    json!({
                        "id": c["id"], "text": c["name"], "linkurls": c["linkurls"],
                        "is_bc": c["is_bc"], "updated_at": c["updated_at"],
                        "modified": c["modified"],
                    })
                })
                .collect();
            Ok(Value::Array(choices))
        }
        .boxed()
    })
}

/// The warmup named by the `override` query param, used as a template for a
/// per-IP override; `null` without one.
fn warmup_override(client: &ApiClient) -> ExtraLoader {
    let client = client.clone();
    Box::new(move |p: Params| {
        let client = client.clone();
        async move {
            match p.get("override").filter(|id| !id.is_empty()) {
                Some(id) => Ok(client.get::<Value>(&format!("warmups/{id}")).await?),
                None => Ok(Value::Null),
            }
        }
        .boxed()
    })
}

/// Credit balance; `null` until the customer exists.
fn credits(client: &ApiClient) -> ExtraLoader {
    let client = client.clone();
    Box::new(move |p: Params| {
        let client = client.clone();
        async move {
            match p.id.existing() {
                Some(id) => Ok(client.get::<Value>(&format!("companies/{id}/credits")).await?),
                None => Ok(Value::Null),
            }
        }
        .boxed()
    })
}
