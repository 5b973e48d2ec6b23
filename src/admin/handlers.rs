use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::policy::{EffectivePolicy, OverrideAction, PolicyStore};
use crate::routing::{PolicyRoute, RequestTarget};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub directives: usize,
    pub routes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteStatus {
    pub name: String,
    pub host: Option<String>,
    pub path_prefix: Option<String>,
    pub priority: u32,
    pub set: BTreeMap<String, String>,
    pub remove: Vec<String>,
    pub protect: Vec<String>,
}

impl From<&PolicyRoute> for RouteStatus {
    fn from(route: &PolicyRoute) -> Self {
        let mut set = BTreeMap::new();
        let mut remove = Vec::new();
        for (name, action) in route.overrides().actions() {
            match action {
                OverrideAction::Set(directive) => {
                    set.insert(name.to_string(), directive.value().to_string());
                }
                OverrideAction::Remove => remove.push(name.to_string()),
            }
        }

        Self {
            name: route.name().to_string(),
            host: route.host().map(str::to_string),
            path_prefix: route.path_prefix().map(str::to_string),
            priority: route.priority(),
            set,
            remove,
            protect: route.overrides().protected().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EffectiveQuery {
    #[serde(default = "root_path")]
    pub path: String,
    pub host: Option<String>,
}

fn root_path() -> String {
    "/".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveStatus {
    pub route: Option<String>,
    pub headers: BTreeMap<String, String>,
}

fn store_headers(store: &PolicyStore) -> BTreeMap<String, String> {
    store
        .all()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn policy_headers(policy: &EffectivePolicy) -> BTreeMap<String, String> {
    policy
        .iter()
        .map(|d| (d.name().to_string(), d.value().to_string()))
        .collect()
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let snapshot = state.engine.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        directives: snapshot.store().len(),
        routes: snapshot.routes().len(),
    })
}

pub async fn get_policy(State(state): State<AdminState>) -> Json<BTreeMap<String, String>> {
    Json(store_headers(state.engine.snapshot().store()))
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteStatus>> {
    let snapshot = state.engine.snapshot();
    Json(snapshot.routes().iter().map(RouteStatus::from).collect())
}

pub async fn get_effective(
    State(state): State<AdminState>,
    Query(query): Query<EffectiveQuery>,
) -> Json<EffectiveStatus> {
    let snapshot = state.engine.snapshot();
    let target = RequestTarget::new(query.host.as_deref(), &query.path);
    let (route, policy) = snapshot.effective_for(&target);

    Json(EffectiveStatus {
        route: route.map(|r| r.name().to_string()),
        headers: policy_headers(&policy),
    })
}
