use std::sync::Arc;

use crate::context::ContextFn;
use crate::error::{ContractError, NodeKind};
use crate::handlers::{ImplNode, ImplTree, RouteImpl};
use crate::spec::{join_key, ContractNode, ContractRouter, Route};

/// A contract route paired with its implementation
#[derive(Debug, Clone)]
pub struct BoundRoute {
    /// Dotted key path, e.g. `pets.get`
    pub key_path: String,
    pub route: Arc<Route>,
    pub route_impl: RouteImpl,
    /// Context function of the nearest enclosing router that declares one
    pub context_fn: Option<ContextFn>,
}

/// Pair every implementation leaf with its contract route
///
/// Traversal follows the implementation tree's key order. The whole tree is
/// checked: a node-kind mismatch, an implementation key the contract does not
/// declare, or a contract node left unimplemented fails the walk, and no
/// partial result is returned.
pub fn walk(contract: &ContractRouter, implementation: &ImplTree) -> Result<Vec<BoundRoute>, ContractError> {
    let mut out = Vec::new();
    walk_router(contract, implementation, "", None, &mut out)?;
    Ok(out)
}

fn walk_router(
    contract: &ContractRouter,
    implementation: &ImplTree,
    prefix: &str,
    inherited: Option<&ContextFn>,
    out: &mut Vec<BoundRoute>,
) -> Result<(), ContractError> {
    let context_fn = contract.context().or(inherited);

    for (key, node) in implementation.iter() {
        let key_path = join_key(prefix, key);
        let Some(schema) = contract.get(key) else {
            return Err(ContractError::UnknownRoute { key_path });
        };
        match (node, schema) {
            (ImplNode::Router(tree), ContractNode::Router(router)) => {
                walk_router(router, tree, &key_path, context_fn, out)?;
            }
            (ImplNode::Router(_), ContractNode::Route(_)) => {
                return Err(ContractError::StructuralMismatch {
                    key_path,
                    expected: NodeKind::Router,
                    found: NodeKind::Route,
                });
            }
            (ImplNode::Route(_), ContractNode::Router(_)) => {
                return Err(ContractError::StructuralMismatch {
                    key_path,
                    expected: NodeKind::Route,
                    found: NodeKind::Router,
                });
            }
            (ImplNode::Route(route_impl), ContractNode::Route(route)) => out.push(BoundRoute {
                key_path,
                route: Arc::clone(route),
                route_impl: route_impl.clone(),
                context_fn: context_fn.cloned(),
            }),
        }
    }

    if let Some((key, _)) = contract
        .iter()
        .find(|(key, _)| !implementation.contains_key(key))
    {
        return Err(ContractError::MissingImplementation {
            key_path: join_key(prefix, key),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::RouteOutput;
    use serde_json::json;

    fn ok_tree(keys: &[&str]) -> ImplTree {
        keys.iter().fold(ImplTree::new(), |tree, key| {
            tree.handle(*key, |_| async { Ok(RouteOutput::json(200, json!(null))) })
        })
    }

    #[test]
    fn follows_implementation_order() {
        let contract = ContractRouter::new()
            .route("a", Route::get("/a"))
            .route("b", Route::get("/b"))
            .route("c", Route::get("/c"));
        let bound = walk(&contract, &ok_tree(&["c", "a", "b"])).unwrap();
        let keys: Vec<_> = bound.iter().map(|b| b.key_path.as_str()).collect();
        assert_eq!(keys, ["c", "a", "b"]);
    }

    #[test]
    fn router_where_route_declared() {
        let contract = ContractRouter::new().route("pets", Route::get("/pets"));
        let implementation = ImplTree::new().nest("pets", ok_tree(&["list"]));
        let err = walk(&contract, &implementation).unwrap_err();
        assert_eq!(
            err,
            ContractError::StructuralMismatch {
                key_path: "pets".into(),
                expected: NodeKind::Router,
                found: NodeKind::Route,
            }
        );
    }

    #[test]
    fn route_where_router_declared() {
        let contract = ContractRouter::new().nest(
            "pets",
            ContractRouter::new().route("list", Route::get("/pets")),
        );
        let err = walk(&contract, &ok_tree(&["pets"])).unwrap_err();
        assert_eq!(
            err,
            ContractError::StructuralMismatch {
                key_path: "pets".into(),
                expected: NodeKind::Route,
                found: NodeKind::Router,
            }
        );
    }

    #[test]
    fn nested_keys_are_dotted() {
        let contract = ContractRouter::new().nest(
            "pets",
            ContractRouter::new().route("get", Route::get("/pets/{id}")),
        );
        let err = walk(&contract, &ImplTree::new().nest("pets", ok_tree(&["get", "delete"])))
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::UnknownRoute {
                key_path: "pets.delete".into()
            }
        );
        let err = walk(&contract, &ImplTree::new().nest("pets", ImplTree::new())).unwrap_err();
        assert_eq!(
            err,
            ContractError::MissingImplementation {
                key_path: "pets.get".into()
            }
        );
    }

    #[test]
    fn context_is_inherited_from_nearest_router() {
        let contract = ContractRouter::new()
            .with_context(|_req, _route| async { Ok(1u8) })
            .route("root", Route::get("/"))
            .nest(
                "pets",
                ContractRouter::new().route("list", Route::get("/pets")),
            );
        let implementation = ok_tree(&["root"]).nest("pets", ok_tree(&["list"]));
        let bound = walk(&contract, &implementation).unwrap();
        assert!(bound.iter().all(|b| b.context_fn.is_some()));

        let plain = ContractRouter::new().route("root", Route::get("/"));
        let bound = walk(&plain, &ok_tree(&["root"])).unwrap();
        assert!(bound[0].context_fn.is_none());
    }
}
