//! # Property-Based Tests
//!
//! Resolution invariants over randomly shaped component trees.

use compref_core::{
    ComponentRef, ComponentReport, ComponentType, InMemoryIndex, KeyResolver, RawComponentNode,
    ReportMetadata, Resolution, SequentialUuids,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TREE GENERATION
// =============================================================================

/// A generated tree: node type and parent for every ref (root = 1).
#[derive(Debug, Clone)]
struct Tree {
    nodes: BTreeMap<u32, (ComponentType, Option<u32>)>,
}

impl Tree {
    /// Build a tree from `(parent choice, type choice)` pairs.
    ///
    /// Parents are picked among earlier non-file nodes, so every generated
    /// tree is well formed.
    fn from_choices(choices: &[(usize, u8)]) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(1, (ComponentType::Project, None));
        let mut containers = vec![1u32];

        for (i, &(parent_choice, type_choice)) in choices.iter().enumerate() {
            let r = i as u32 + 2;
            let parent = containers[parent_choice % containers.len()];
            let component_type = match type_choice {
                0 => ComponentType::Module,
                1 => ComponentType::Directory,
                _ => ComponentType::File,
            };
            if component_type != ComponentType::File {
                containers.push(r);
            }
            nodes.insert(r, (component_type, Some(parent)));
        }
        Self { nodes }
    }

    fn children(&self, r: u32) -> Vec<u32> {
        self.nodes
            .iter()
            .filter(|(_, (_, parent))| *parent == Some(r))
            .map(|(child, _)| *child)
            .collect()
    }

    fn report(&self, branch: Option<&str>, reverse_children: bool) -> ComponentReport {
        let mut metadata = ReportMetadata::new(1);
        if let Some(branch) = branch {
            metadata = metadata.with_branch(branch);
        }

        let nodes = self.nodes.iter().map(|(&r, &(component_type, _))| {
            let mut children = self.children(r);
            if reverse_children {
                children.reverse();
            }
            let node = match component_type {
                ComponentType::Project => RawComponentNode::project(r, format!("PROJECT{r}")),
                ComponentType::Module => RawComponentNode::module(r, format!("MODULE{r}")),
                ComponentType::Directory => RawComponentNode::directory(r, format!("dir{r}")),
                ComponentType::File => RawComponentNode::file(r, format!("file{r}.rs")),
            };
            node.with_children(children)
        });

        ComponentReport::from_components(metadata, nodes).expect("build report")
    }

    /// Reference key derivation: walk up to the nearest module explicitly.
    fn expected_key(&self, r: u32, branch: Option<&str>) -> String {
        let module_key = |m: u32| -> String {
            let declared = match self.nodes[&m].0 {
                ComponentType::Project => format!("PROJECT{m}"),
                _ => format!("MODULE{m}"),
            };
            match branch {
                Some(b) => format!("{declared}:{b}"),
                None => declared,
            }
        };

        let (component_type, mut parent) = self.nodes[&r];
        if component_type.is_module_scope() {
            return module_key(r);
        }
        let path = match component_type {
            ComponentType::Directory => format!("dir{r}"),
            _ => format!("file{r}.rs"),
        };
        while let Some(p) = parent {
            if self.nodes[&p].0.is_module_scope() {
                return format!("{}:{}", module_key(p), path);
            }
            parent = self.nodes[&p].1;
        }
        String::new()
    }
}

fn resolve(report: &ComponentReport, index: &InMemoryIndex, seed: &str) -> Resolution {
    let mut minter = SequentialUuids::seeded(seed);
    KeyResolver::new(index, &mut minter)
        .resolve(report)
        .expect("resolve")
}

fn keys(resolution: &Resolution) -> BTreeMap<u32, String> {
    resolution
        .cache
        .iter()
        .map(|(r, c)| (r.0, c.key().to_string()))
        .collect()
}

fn tree_strategy() -> impl Strategy<Value = Tree> {
    vec((0usize..1000, 0u8..3), 0..40).prop_map(|choices| Tree::from_choices(&choices))
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every ref in the report resolves; nothing else does.
    #[test]
    fn every_ref_resolves(tree in tree_strategy()) {
        let report = tree.report(None, false);
        let resolution = resolve(&report, &InMemoryIndex::new(), "run");

        prop_assert_eq!(resolution.cache.len(), tree.nodes.len());
        for &r in tree.nodes.keys() {
            prop_assert!(resolution.cache.get(ComponentRef(r)).is_some());
        }
        let missing = tree.nodes.len() as u32 + 1;
        prop_assert!(resolution.cache.get(ComponentRef(missing)).is_none());
    }

    /// Keys match the nearest-module rule computed independently.
    #[test]
    fn keys_follow_nearest_module(tree in tree_strategy()) {
        let report = tree.report(None, false);
        let resolution = resolve(&report, &InMemoryIndex::new(), "run");

        for (r, key) in keys(&resolution) {
            prop_assert_eq!(key, tree.expected_key(r, None));
        }
    }

    /// Sibling order changes resolution order, never keys.
    #[test]
    fn keys_independent_of_sibling_order(tree in tree_strategy()) {
        let forward = resolve(&tree.report(None, false), &InMemoryIndex::new(), "run");
        let reversed = resolve(&tree.report(None, true), &InMemoryIndex::new(), "run");

        prop_assert_eq!(keys(&forward), keys(&reversed));
    }

    /// The branch appears exactly once, right after the module key.
    #[test]
    fn branch_appears_once(tree in tree_strategy()) {
        let plain = keys(&resolve(&tree.report(None, false), &InMemoryIndex::new(), "run"));
        let branched = keys(&resolve(&tree.report(Some("BRANCH"), false), &InMemoryIndex::new(), "run"));

        for (r, key) in &branched {
            prop_assert_eq!(key.matches("BRANCH").count(), 1);
            prop_assert_eq!(&key.replacen(":BRANCH", "", 1), &plain[r]);
            prop_assert_eq!(key, &tree.expected_key(*r, Some("BRANCH")));
        }
    }

    /// Re-resolving an unchanged tree against its own identities reuses all of them.
    #[test]
    fn identifiers_reused_for_unchanged_tree(tree in tree_strategy()) {
        let report = tree.report(Some("main"), false);
        let first = resolve(&report, &InMemoryIndex::new(), "first");
        let index = InMemoryIndex::from_cache(&first.cache);
        let second = resolve(&report, &index, "second");

        prop_assert_eq!(second.stats.minted, 0);
        for (r, component) in first.cache.iter() {
            prop_assert_eq!(second.cache.get(r).map(|c| c.uuid()), Some(component.uuid()));
        }
    }

    /// Fresh identifiers never repeat an identifier already in the index.
    #[test]
    fn fresh_identifiers_are_unseen(tree in tree_strategy()) {
        let report = tree.report(None, false);
        let previous = resolve(&tree.report(Some("old"), false), &InMemoryIndex::new(), "run");
        let index = InMemoryIndex::from_cache(&previous.cache);
        let old_uuids: BTreeSet<_> = previous.cache.iter().map(|(_, c)| c.uuid().to_string()).collect();

        let current = resolve(&report, &index, "current");
        prop_assert_eq!(current.stats.reused, 0);
        let mut seen = BTreeSet::new();
        for (_, component) in current.cache.iter() {
            prop_assert!(!old_uuids.contains(component.uuid()));
            prop_assert!(seen.insert(component.uuid().to_string()));
        }
    }
}
