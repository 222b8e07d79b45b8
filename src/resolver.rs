/// Dependency resolution: one instantiation order for the registered modules.
///
/// Kahn's algorithm over the "depends on" edges. Among modules that are ready
/// at the same time the one registered first goes first, so a given set of
/// registrations always resolves to the same order.
use crate::{
    error::AnalysisError,
    module::{Binding, Dependency, ModuleKind},
};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy)]
pub struct Declaration {
    pub kind:         ModuleKind,
    pub dependencies: &'static [Dependency],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Indices into the declaration list, in instantiation order.
    pub order:    Vec<usize>,
    /// Per instantiation slot, the bindings of its dependencies to earlier slots.
    pub bindings: Vec<Vec<Binding>>,
}

pub fn resolve(declarations: &[Declaration]) -> Result<Resolution, AnalysisError> {
    let mut position: HashMap<ModuleKind, usize> = HashMap::with_capacity(declarations.len());
    for (idx, decl) in declarations.iter().enumerate() {
        if position.insert(decl.kind, idx).is_some() {
            return Err(AnalysisError::DuplicateModule(decl.kind));
        }
    }

    // Edges: dependency -> dependent
    let mut in_degree  = vec![0usize; declarations.len()];
    let mut dependents = vec![Vec::new(); declarations.len()];
    for (idx, decl) in declarations.iter().enumerate() {
        for dep in decl.dependencies {
            let Some(&target) = position.get(&dep.kind) else {
                return Err(AnalysisError::MissingDependency {
                    module:     decl.kind,
                    name:       dep.name,
                    dependency: dep.kind,
                });
            };
            dependents[target].push(idx);
            in_degree[idx] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &deg)| deg == 0)
        .map(|(idx, _)| idx)
        .collect();

    let mut order = Vec::with_capacity(declarations.len());
    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &next in &dependents[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() < declarations.len() {
        let modules = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg > 0)
            .map(|(idx, _)| declarations[idx].kind)
            .collect();
        return Err(AnalysisError::CyclicDependency { modules });
    }

    let mut slot = vec![0usize; declarations.len()];
    for (s, &idx) in order.iter().enumerate() {
        slot[idx] = s;
    }
    let bindings = order
        .iter()
        .map(|&idx| {
            declarations[idx]
                .dependencies
                .iter()
                .map(|&dependency| Binding { dependency, index: slot[position[&dependency.kind]] })
                .collect()
        })
        .collect();

    Ok(Resolution { order, bindings })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::dependency;

    const A: ModuleKind = ModuleKind::Custom("a");
    const B: ModuleKind = ModuleKind::Custom("b");
    const C: ModuleKind = ModuleKind::Custom("c");
    const D: ModuleKind = ModuleKind::Custom("d");

    const NONE:   &[Dependency] = &[];
    const ON_A:   &[Dependency] = &[dependency("a", A)];
    const ON_B:   &[Dependency] = &[dependency("b", B)];
    const ON_C:   &[Dependency] = &[dependency("c", C)];
    const ON_A_C: &[Dependency] = &[dependency("first", A), dependency("third", C)];

    fn decl(kind: ModuleKind, dependencies: &'static [Dependency]) -> Declaration {
        Declaration { kind, dependencies }
    }

    fn kinds(decls: &[Declaration], res: &Resolution) -> Vec<ModuleKind> {
        res.order.iter().map(|&i| decls[i].kind).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let decls = [decl(D, ON_A_C), decl(C, ON_B), decl(B, NONE), decl(A, NONE)];
        let res = resolve(&decls).unwrap();
        assert_eq!(kinds(&decls, &res), vec![B, C, A, D]);

        // d's bindings point at the slots of a and c
        let d_slot = 3;
        let names: Vec<_> = res.bindings[d_slot].iter().map(|b| (b.dependency.name, b.index)).collect();
        assert_eq!(names, vec![("first", 2), ("third", 1)]);
    }

    #[test]
    fn independent_modules_keep_declaration_order() {
        let decls = [decl(C, NONE), decl(A, NONE), decl(B, NONE)];
        let res = resolve(&decls).unwrap();
        assert_eq!(kinds(&decls, &res), vec![C, A, B]);
        assert!(res.bindings.iter().all(Vec::is_empty));
    }

    #[test]
    fn resolution_is_deterministic() {
        let decls = [decl(B, ON_A), decl(A, NONE), decl(C, ON_A), decl(D, NONE)];
        let first = resolve(&decls).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve(&decls).unwrap(), first);
        }
    }

    #[test]
    fn reports_missing_dependency() {
        let err = resolve(&[decl(B, ON_A)]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingDependency { module: B, name: "a", dependency: A }
        );
    }

    #[test]
    fn reports_cycle_members() {
        let decls = [decl(D, NONE), decl(A, ON_C), decl(B, ON_A), decl(C, ON_B)];
        let err = resolve(&decls).unwrap_err();
        assert_eq!(err, AnalysisError::CyclicDependency { modules: vec![A, B, C] });
    }

    #[test]
    fn rejects_duplicate_kind() {
        let err = resolve(&[decl(A, NONE), decl(A, NONE)]).unwrap_err();
        assert_eq!(err, AnalysisError::DuplicateModule(A));
    }
}
