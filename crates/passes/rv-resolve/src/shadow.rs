//! Override and shadow removal
//!
//! Both filters run over every merged result set. Override removal runs
//! first because it changes which declarations collide.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use rv_entity::{CtorKind, DeclId, EntityGraph, LanguageVersion, Selector};
use rv_intern::Symbol;

use crate::config::ShadowingPolicy;

/// Unavailable outright or in the active language version
pub fn is_unavailable(graph: &EntityGraph, decl: DeclId, version: LanguageVersion) -> bool {
    let availability = graph.decl(decl).availability;
    availability.is_unavailable() || availability.is_unavailable_in(version)
}

/// Drop every declaration overridden (transitively) by another result
///
/// Returns whether anything was removed.
pub fn remove_overridden_decls(graph: &EntityGraph, decls: &mut Vec<DeclId>) -> bool {
    if decls.len() < 2 {
        return false;
    }

    let mut overridden = FxHashSet::default();
    for decl in decls.iter() {
        // Chains may skip links (a foreign base initializer overriding
        // another), so every ancestor is marked, not just the first.
        let mut current = graph.decl(*decl).overridden;
        while let Some(ancestor) = current {
            if !overridden.insert(ancestor) {
                break;
            }
            current = graph.decl(ancestor).overridden;
        }
    }
    if overridden.is_empty() {
        return false;
    }

    let before = decls.len();
    decls.retain(|decl| !overridden.contains(decl));
    decls.len() != before
}

/// Rank of a foreign initializer; lower is better
fn foreign_ctor_rank(
    graph: &EntityGraph,
    ctor: DeclId,
    version: LanguageVersion,
) -> (bool, CtorKind) {
    let kind = graph.decl(ctor).ctor_kind().unwrap_or(CtorKind::Factory);
    (is_unavailable(graph, ctor, version), kind)
}

/// Drop declarations hidden by a same-signature, same-name declaration
///
/// Within each `(signature, base name)` bucket, compared pairwise:
/// concrete beats protocol (per `policy`), available beats unavailable, and
/// the current module beats other modules unless a protocol member is
/// involved. Foreign initializers sharing a selector keep only the best
/// ranked. Returns whether anything was removed.
pub fn remove_shadowed_decls(
    graph: &EntityGraph,
    policy: ShadowingPolicy,
    version: LanguageVersion,
    decls: &mut Vec<DeclId>,
    current_module: DeclId,
) -> bool {
    let mut collisions: IndexMap<(Symbol, Symbol), Vec<DeclId>> = IndexMap::new();
    let mut foreign_ctors: IndexMap<(Selector, bool), Vec<DeclId>> = IndexMap::new();
    let mut any_collisions = false;

    for decl_id in decls.iter().copied() {
        let decl = graph.decl(decl_id);

        if decl.is_foreign() && decl.is_constructor() {
            if let Some(selector) = decl.selector() {
                let known = foreign_ctors
                    .entry((selector, !decl.is_static()))
                    .or_default();
                any_collisions |= !known.is_empty();
                known.push(decl_id);
            }
        }

        // Cyclic references have no signature yet.
        if decl.is_being_validated() {
            continue;
        }
        let (Some(signature), Some(base)) = (decl.signature(), decl.base_name()) else {
            continue;
        };
        // Member types are never shadowed.
        if decl.is_type_decl() && graph.context(decl.owner).is_type_context() {
            continue;
        }

        let known = collisions.entry((signature, base)).or_default();
        any_collisions |= !known.is_empty();
        known.push(decl_id);
    }

    if !any_collisions {
        return false;
    }

    let mut shadowed = FxHashSet::default();
    for colliding in collisions.values().filter(|bucket| bucket.len() > 1) {
        for (first_idx, first) in colliding.iter().copied().enumerate() {
            let first_module = graph.module_of(first);
            let first_in_protocol = graph.is_protocol_member(first);

            for second in colliding.iter().copied().skip(first_idx + 1) {
                let second_module = graph.module_of(second);
                let second_in_protocol = graph.is_protocol_member(second);

                if policy.prefer_concrete_over_protocol && first_in_protocol != second_in_protocol {
                    if first_in_protocol {
                        shadowed.insert(first);
                        break;
                    }
                    shadowed.insert(second);
                    continue;
                }

                let first_unavailable = is_unavailable(graph, first, version);
                if first_unavailable != is_unavailable(graph, second, version) {
                    if first_unavailable {
                        shadowed.insert(first);
                        break;
                    }
                    shadowed.insert(second);
                    continue;
                }

                if first_in_protocol || second_in_protocol {
                    continue;
                }
                if (first_module == current_module) == (second_module == current_module) {
                    continue;
                }
                if first_module == current_module {
                    shadowed.insert(second);
                    continue;
                }
                shadowed.insert(first);
                break;
            }
        }
    }

    for ctors in foreign_ctors.values().filter(|ctors| ctors.len() > 1) {
        let best = ctors
            .iter()
            .map(|ctor| foreign_ctor_rank(graph, *ctor, version))
            .min();
        for ctor in ctors {
            if Some(foreign_ctor_rank(graph, *ctor, version)) > best {
                shadowed.insert(*ctor);
            }
        }
    }

    if shadowed.is_empty() {
        return false;
    }
    let before = decls.len();
    decls.retain(|decl| !shadowed.contains(decl));
    decls.len() != before
}

/// Whether `decl` is a private declaration of the file named `discriminator`
fn matches_discriminator(graph: &EntityGraph, decl: DeclId, discriminator: Symbol) -> bool {
    let target = graph.decl(decl);
    if target.access() > rv_entity::AccessLevel::FilePrivate {
        return false;
    }
    graph
        .file_unit(target.owner)
        .is_some_and(|unit| unit.discriminator == discriminator)
}

/// Keep only the private results of the preferred file, if there are any
pub fn filter_for_discriminator<T>(
    graph: &EntityGraph,
    results: &mut Vec<T>,
    discriminator: Symbol,
    decl_of: impl Fn(&T) -> DeclId,
) {
    if results.len() < 2 {
        return;
    }
    let any_match = results
        .iter()
        .any(|result| matches_discriminator(graph, decl_of(result), discriminator));
    if any_match {
        results.retain(|result| matches_discriminator(graph, decl_of(result), discriminator));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv_entity::{
        AccessLevel, Availability, ConstructorDecl, ContextId, DeclFlags, DeclKind, FuncDecl,
        NominalDecl, NominalKind, SourceFileKind,
    };
    use rv_span::FileId;

    const VERSION: LanguageVersion = LanguageVersion::new(5, 0);

    fn module_with_file(graph: &mut EntityGraph, name: &str, id: u32) -> (DeclId, ContextId) {
        let module = graph.add_module(name);
        let file = graph
            .add_file(module, FileId::new(id), SourceFileKind::Library, name)
            .unwrap();
        (module, file)
    }

    fn func(graph: &mut EntityGraph, owner: ContextId, name: &str, signature: &str) -> DeclId {
        let name = graph.name(name);
        let decl = graph.add_decl(owner, Some(name), DeclKind::Func(FuncDecl::default()));
        graph.set_signature(decl, signature).unwrap();
        decl
    }

    fn nominal(graph: &mut EntityGraph, owner: ContextId, name: &str, kind: NominalKind) -> ContextId {
        let name = graph.name(name);
        let decl = graph.add_decl(owner, Some(name), DeclKind::Nominal(NominalDecl::new(kind)));
        graph.decl(decl).as_context.unwrap()
    }

    #[test]
    fn test_override_chain_removed_transitively() {
        let mut graph = EntityGraph::default();
        let (_, file) = module_with_file(&mut graph, "Lib", 0);
        let base = func(&mut graph, file, "draw", "() -> ()");
        let middle = func(&mut graph, file, "draw", "() -> ()");
        let leaf = func(&mut graph, file, "draw", "() -> ()");
        graph.set_overridden(middle, base);
        graph.set_overridden(leaf, middle);

        let mut decls = vec![base, leaf];
        assert!(remove_overridden_decls(&graph, &mut decls));
        assert_eq!(decls, vec![leaf]);

        let mut single = vec![base];
        assert!(!remove_overridden_decls(&graph, &mut single));
    }

    #[test]
    fn test_current_module_wins() {
        let mut graph = EntityGraph::default();
        let (lib1, file1) = module_with_file(&mut graph, "Lib1", 0);
        let (lib2, file2) = module_with_file(&mut graph, "Lib2", 1);
        let mine = func(&mut graph, file1, "f", "() -> ()");
        let theirs = func(&mut graph, file2, "f", "() -> ()");

        let mut decls = vec![theirs, mine];
        assert!(remove_shadowed_decls(&graph, ShadowingPolicy::default(), VERSION, &mut decls, lib1));
        assert_eq!(decls, vec![mine]);

        let mut decls = vec![theirs, mine];
        remove_shadowed_decls(&graph, ShadowingPolicy::default(), VERSION, &mut decls, lib2);
        assert_eq!(decls, vec![theirs]);
    }

    #[test]
    fn test_different_signatures_do_not_collide() {
        let mut graph = EntityGraph::default();
        let (lib1, file1) = module_with_file(&mut graph, "Lib1", 0);
        let (_, file2) = module_with_file(&mut graph, "Lib2", 1);
        let one = func(&mut graph, file1, "f", "(Int) -> ()");
        let two = func(&mut graph, file2, "f", "(String) -> ()");
        let pending = func(&mut graph, file2, "f", "(Int) -> ()");
        graph.insert_flags(pending, DeclFlags::BEING_VALIDATED);

        let mut decls = vec![one, two, pending];
        assert!(!remove_shadowed_decls(&graph, ShadowingPolicy::default(), VERSION, &mut decls, lib1));
        assert_eq!(decls.len(), 3);
    }

    #[test]
    fn test_available_beats_unavailable() {
        let mut graph = EntityGraph::default();
        let (lib, file) = module_with_file(&mut graph, "Lib", 0);
        let (_, other) = module_with_file(&mut graph, "Other", 1);
        let old = func(&mut graph, file, "f", "() -> ()");
        graph.set_availability(old, Availability::obsoleted_in(LanguageVersion::new(5, 0)));
        let new = func(&mut graph, other, "f", "() -> ()");

        let mut decls = vec![old, new];
        remove_shadowed_decls(&graph, ShadowingPolicy::default(), VERSION, &mut decls, lib);
        assert_eq!(decls, vec![new]);

        let mut decls = vec![old, new];
        remove_shadowed_decls(&graph, ShadowingPolicy::default(), LanguageVersion::new(4, 2), &mut decls, lib);
        assert_eq!(decls, vec![old]);
    }

    #[test]
    fn test_concrete_over_protocol_is_policy() {
        let mut graph = EntityGraph::default();
        let (lib, file) = module_with_file(&mut graph, "Lib", 0);
        let proto = nominal(&mut graph, file, "Shape", NominalKind::Protocol);
        let concrete = nominal(&mut graph, file, "Square", NominalKind::Struct);
        let requirement = func(&mut graph, proto, "area", "() -> Int");
        let witness = func(&mut graph, concrete, "area", "() -> Int");

        let mut decls = vec![requirement, witness];
        remove_shadowed_decls(&graph, ShadowingPolicy::default(), VERSION, &mut decls, lib);
        assert_eq!(decls, vec![witness]);

        let lenient = ShadowingPolicy {
            prefer_concrete_over_protocol: false,
        };
        let mut decls = vec![requirement, witness];
        assert!(!remove_shadowed_decls(&graph, lenient, VERSION, &mut decls, lib));
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn test_foreign_initializers_ranked_by_kind() {
        let mut graph = EntityGraph::default();
        let (lib, file) = module_with_file(&mut graph, "Kit", 0);
        let view = nominal(&mut graph, file, "View", NominalKind::Class);
        let selector = Selector(graph.interner().intern("initWithFrame:"));
        let mut ctor = |kind: CtorKind, signature: &str| {
            let name = graph.compound_name("init", &["frame"]);
            let mut data = ConstructorDecl::new(kind);
            data.selector = Some(selector);
            let decl = graph.add_decl(view, Some(name), DeclKind::Constructor(data));
            graph.insert_flags(decl, DeclFlags::FOREIGN);
            graph.set_signature(decl, signature).unwrap();
            decl
        };
        let factory = ctor(CtorKind::Factory, "(Rect) -> View");
        let designated = ctor(CtorKind::Designated, "(Frame) -> View");

        let mut decls = vec![factory, designated];
        assert!(remove_shadowed_decls(&graph, ShadowingPolicy::default(), VERSION, &mut decls, lib));
        assert_eq!(decls, vec![designated]);
    }

    #[test]
    fn test_discriminator_keeps_matching_private_results() {
        let mut graph = EntityGraph::default();
        let module = graph.add_module("Repl");
        let turn1 = graph
            .add_file(module, FileId::new(0), SourceFileKind::Repl, "turn1")
            .unwrap();
        let turn2 = graph
            .add_file(module, FileId::new(1), SourceFileKind::Repl, "turn2")
            .unwrap();
        let old = func(&mut graph, turn1, "helper", "() -> ()");
        let new = func(&mut graph, turn2, "helper", "() -> ()");
        graph.set_access(old, AccessLevel::FilePrivate).unwrap();
        graph.set_access(new, AccessLevel::FilePrivate).unwrap();

        let turn2_name = graph.interner().intern("turn2");
        let mut results = vec![old, new];
        filter_for_discriminator(&graph, &mut results, turn2_name, |decl| *decl);
        assert_eq!(results, vec![new]);

        let unknown = graph.interner().intern("turn9");
        let mut results = vec![old, new];
        filter_for_discriminator(&graph, &mut results, unknown, |decl| *decl);
        assert_eq!(results, vec![old, new]);
    }
}
