use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::error::FernError;
use crate::func::Func;

/// The default namespace functions land in when no explicit one is given.
pub const GLOBAL_NS: &str = "fern-global-ns";

static REGISTRY: Lazy<Mutex<HashMap<String, HashMap<String, Arc<Func>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Registers `func` in the global namespace under its unique id. Fails if
/// the id is already bound.
pub fn regfn(func: Arc<Func>) -> Result<String, FernError> {
    regfn_in(GLOBAL_NS, func)
}

/// Registers `func` in namespace `ns`. The returned key is
/// `"{ns}/{unique-id}"` and is what `lookup` expects.
pub fn regfn_in(ns: &str, func: Arc<Func>) -> Result<String, FernError> {
    if ns.is_empty() || ns.contains('/') {
        return Err(FernError::access_denied(format!("bad namespace: {:?}", ns)));
    }
    let mut registry = REGISTRY.lock().unwrap();
    let space = registry.entry(ns.to_string()).or_default();
    let id = func.unique_id().to_string();
    if space.contains_key(&id) {
        return Err(FernError::access_denied(format!(
            "{} is already bound in {}",
            id, ns
        )));
    }
    tracing::debug!(ns, id = %id, "registered function");
    space.insert(id.clone(), func);
    Ok(format!("{}/{}", ns, id))
}

/// Resolves a `"{ns}/{unique-id}"` key back to its function.
pub fn lookup(key: &str) -> Result<Arc<Func>, FernError> {
    let (ns, id) = key
        .split_once('/')
        .ok_or_else(|| FernError::access_denied(format!("malformed key: {:?}", key)))?;
    let registry = REGISTRY.lock().unwrap();
    registry
        .get(ns)
        .and_then(|space| space.get(id))
        .cloned()
        .ok_or_else(|| FernError::access_denied(format!("unbound key: {:?}", key)))
}
