//! Read-side hierarchy operations over a flat category snapshot.
//!
//! Every function here is pure: it takes one owner's full set of categories
//! and never performs I/O. Malformed input (dangling parents, cycles written
//! around the service) degrades to partial results instead of failing, and
//! every traversal is bounded so that a corrupt snapshot cannot loop.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::features::categories::models::{Category, CategoryTree, MoveValidation};
use crate::shared::constants::CATEGORY_PATH_SEPARATOR;

pub const ERR_OWN_PARENT: &str = "Category cannot be its own parent";
pub const ERR_OWN_DESCENDANT: &str = "Cannot move category to its own descendant";

/// Sibling presentation order: `display_order`, then name.
pub fn sibling_order(a: &Category, b: &Category) -> Ordering {
    a.display_order
        .cmp(&b.display_order)
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort a flat list into sibling presentation order.
pub fn sort_siblings(categories: &mut [Category]) {
    categories.sort_by(sibling_order);
}

/// Build the category forest from a flat list in any order.
///
/// Parents that do not resolve inside the snapshot turn their children into
/// roots. Levels are assigned top-down once every child list is complete, so
/// the input order has no effect on them.
pub fn build_tree(categories: &[Category]) -> Vec<CategoryTree> {
    let index: HashMap<Uuid, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();

    let mut children_of: HashMap<Uuid, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for (i, category) in categories.iter().enumerate() {
        match category.parent_id {
            Some(parent_id) if parent_id != category.id && index.contains_key(&parent_id) => {
                children_of.entry(parent_id).or_default().push(i);
            }
            _ => roots.push(i),
        }
    }

    let mut visited = vec![false; categories.len()];
    let mut forest: Vec<CategoryTree> = Vec::with_capacity(roots.len());

    for root in roots {
        if !visited[root] {
            forest.push(assemble(root, 0, categories, &children_of, &mut visited));
        }
    }

    // Anything still unvisited sits on a parent cycle. Surface it as a root
    // rather than dropping it.
    for i in 0..categories.len() {
        if !visited[i] {
            tracing::warn!(
                category_id = %categories[i].id,
                "Category is part of a parent cycle, presenting it as a root"
            );
            forest.push(assemble(i, 0, categories, &children_of, &mut visited));
        }
    }

    sort_nodes(&mut forest);
    forest
}

fn assemble(
    idx: usize,
    level: usize,
    categories: &[Category],
    children_of: &HashMap<Uuid, Vec<usize>>,
    visited: &mut [bool],
) -> CategoryTree {
    visited[idx] = true;

    let mut node = CategoryTree::new(categories[idx].clone());
    node.level = level;

    if let Some(kids) = children_of.get(&categories[idx].id) {
        for &kid in kids {
            if !visited[kid] {
                let child = assemble(kid, level + 1, categories, children_of, visited);
                node.children.push(child);
            }
        }
    }

    sort_nodes(&mut node.children);
    node
}

fn sort_nodes(nodes: &mut [CategoryTree]) {
    nodes.sort_by(|a, b| sibling_order(&a.category, &b.category));
}

/// Pre-order flattening of a forest back into records.
pub fn flatten_tree(tree: &[CategoryTree]) -> Vec<Category> {
    fn walk(nodes: &[CategoryTree], out: &mut Vec<Category>) {
        for node in nodes {
            out.push(node.category.clone());
            walk(&node.children, out);
        }
    }

    let mut out = Vec::new();
    walk(tree, &mut out);
    out
}

/// Human-readable path such as `"Food > Drinks > Tea"`.
///
/// The upward walk stops at a root, at a parent that does not resolve, or
/// after `categories.len()` steps, whichever comes first.
pub fn category_path(category: &Category, categories: &[Category]) -> String {
    let index: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut names: Vec<&str> = vec![category.name.as_str()];
    let mut current = category.parent_id;
    let mut steps = 0;

    while let Some(parent_id) = current {
        if steps >= categories.len() {
            tracing::warn!(
                category_id = %category.id,
                "Path walk exceeded snapshot size, returning partial path"
            );
            break;
        }
        let Some(parent) = index.get(&parent_id) else {
            break;
        };
        names.push(parent.name.as_str());
        current = parent.parent_id;
        steps += 1;
    }

    names.reverse();
    names.join(CATEGORY_PATH_SEPARATOR)
}

/// Path for a category id, `None` if the id is not in the snapshot.
pub fn category_path_by_id(category_id: Uuid, categories: &[Category]) -> Option<String> {
    categories
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| category_path(c, categories))
}

/// Direct children in sibling order.
pub fn children(category_id: Uuid, categories: &[Category]) -> Vec<Category> {
    let mut kids: Vec<Category> = categories
        .iter()
        .filter(|c| c.parent_id == Some(category_id) && c.id != category_id)
        .cloned()
        .collect();
    sort_siblings(&mut kids);
    kids
}

/// All transitive children, breadth-first.
pub fn descendants(category_id: Uuid, categories: &[Category]) -> Vec<Category> {
    let mut children_of: HashMap<Uuid, Vec<&Category>> = HashMap::new();
    for category in categories {
        if let Some(parent_id) = category.parent_id {
            children_of.entry(parent_id).or_default().push(category);
        }
    }
    for kids in children_of.values_mut() {
        kids.sort_by(|a, b| sibling_order(a, b));
    }

    let mut seen: HashSet<Uuid> = HashSet::from([category_id]);
    let mut queue: VecDeque<Uuid> = VecDeque::from([category_id]);
    let mut out = Vec::new();

    while let Some(current) = queue.pop_front() {
        let Some(kids) = children_of.get(&current) else {
            continue;
        };
        for kid in kids {
            if seen.insert(kid.id) {
                out.push((*kid).clone());
                queue.push_back(kid.id);
            }
        }
    }

    out
}

/// The id itself followed by every descendant id.
///
/// This is the membership set used when filtering products by category.
pub fn ids_including_descendants(category_id: Uuid, categories: &[Category]) -> Vec<Uuid> {
    std::iter::once(category_id)
        .chain(descendants(category_id, categories).into_iter().map(|c| c.id))
        .collect()
}

/// Ancestors ordered root first, immediate parent last.
///
/// Empty for a root, for an unknown id, or when the first parent does not
/// resolve.
pub fn ancestors(category_id: Uuid, categories: &[Category]) -> Vec<Category> {
    let index: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let Some(start) = index.get(&category_id) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut current = start.parent_id;

    while let Some(parent_id) = current {
        if out.len() >= categories.len() || parent_id == category_id {
            tracing::warn!(
                category_id = %category_id,
                "Ancestor walk hit a cycle, returning partial chain"
            );
            break;
        }
        let Some(parent) = index.get(&parent_id) else {
            break;
        };
        out.push((*parent).clone());
        current = parent.parent_id;
    }

    out.reverse();
    out
}

/// Decide whether `category_id` may take `new_parent_id` as its parent.
///
/// Must be consulted before every `parent_id` change.
pub fn validate_move(
    category_id: Uuid,
    new_parent_id: Option<Uuid>,
    categories: &[Category],
) -> MoveValidation {
    let Some(new_parent_id) = new_parent_id else {
        return MoveValidation::ok();
    };

    if new_parent_id == category_id {
        return MoveValidation::rejected(ERR_OWN_PARENT);
    }

    let is_descendant = descendants(category_id, categories)
        .iter()
        .any(|c| c.id == new_parent_id);

    if is_descendant {
        return MoveValidation::rejected(ERR_OWN_DESCENDANT);
    }

    MoveValidation::ok()
}

/// Depth-first lookup in a built forest.
pub fn find_in_tree(tree: &[CategoryTree], category_id: Uuid) -> Option<&CategoryTree> {
    for node in tree {
        if node.id() == category_id {
            return Some(node);
        }
        if let Some(found) = find_in_tree(&node.children, category_id) {
            return Some(found);
        }
    }
    None
}

/// Number of levels in the forest: 0 when empty, 1 for roots only.
pub fn max_tree_depth(tree: &[CategoryTree]) -> usize {
    tree.iter()
        .map(|node| 1 + max_tree_depth(&node.children))
        .max()
        .unwrap_or(0)
}

/// Prune the forest to nodes whose name or description contains `term`
/// (case-insensitive), keeping the ancestors that lead to them.
///
/// A matching node keeps its whole subtree. An empty term keeps everything.
pub fn filter_tree(tree: &[CategoryTree], term: &str) -> Vec<CategoryTree> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return tree.to_vec();
    }

    fn matches(category: &Category, needle: &str) -> bool {
        category.name.to_lowercase().contains(needle)
            || category
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }

    fn prune(nodes: &[CategoryTree], needle: &str) -> Vec<CategoryTree> {
        nodes
            .iter()
            .filter_map(|node| {
                if matches(&node.category, needle) {
                    return Some(node.clone());
                }
                let children = prune(&node.children, needle);
                if children.is_empty() {
                    None
                } else {
                    Some(CategoryTree {
                        category: node.category.clone(),
                        level: node.level,
                        children,
                    })
                }
            })
            .collect()
    }

    prune(tree, &needle)
}

/// Next free `display_order` under `parent_id`: max sibling order + 1, or 0.
///
/// `excluding` leaves one category out of the sibling set, typically the one
/// being moved or deleted. `None` when the largest sibling order is already
/// `i32::MAX` and nothing can be appended after it.
pub fn next_display_order(
    parent_id: Option<Uuid>,
    categories: &[Category],
    excluding: Option<Uuid>,
) -> Option<i32> {
    match categories
        .iter()
        .filter(|c| c.parent_id == parent_id && Some(c.id) != excluding)
        .map(|c| c.display_order)
        .max()
    {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{category, fake_category};

    /// A -> B -> C, plus a second root D.
    fn chain() -> (Vec<Category>, Uuid, Uuid, Uuid, Uuid) {
        let owner = Uuid::new_v4();
        let a = category(owner, "A", None, 0);
        let b = category(owner, "B", Some(a.id), 0);
        let c = category(owner, "C", Some(b.id), 0);
        let d = category(owner, "D", None, 1);
        let ids = (a.id, b.id, c.id, d.id);
        (vec![a, b, c, d], ids.0, ids.1, ids.2, ids.3)
    }

    fn ids(categories: &[Category]) -> Vec<Uuid> {
        categories.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_build_tree_empty() {
        assert!(build_tree(&[]).is_empty());
    }

    #[test]
    fn test_build_tree_links_and_levels() {
        let (all, a, b, c, d) = chain();
        let tree = build_tree(&all);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id(), a);
        assert_eq!(tree[1].id(), d);
        assert_eq!(tree[0].children[0].id(), b);
        assert_eq!(tree[0].children[0].level, 1);
        assert_eq!(tree[0].children[0].children[0].id(), c);
        assert_eq!(tree[0].children[0].children[0].level, 2);
    }

    #[test]
    fn test_build_tree_levels_with_children_before_parents() {
        let (mut all, a, b, c, _) = chain();
        all.reverse();

        let tree = build_tree(&all);
        let node_c = find_in_tree(&tree, c).unwrap();
        let node_b = find_in_tree(&tree, b).unwrap();
        let node_a = find_in_tree(&tree, a).unwrap();

        assert_eq!(node_a.level, 0);
        assert_eq!(node_b.level, 1);
        assert_eq!(node_c.level, 2);
    }

    #[test]
    fn test_build_tree_sorts_siblings_by_display_order_then_name() {
        let owner = Uuid::new_v4();
        let root = category(owner, "Root", None, 0);
        let late = category(owner, "Late", Some(root.id), 5);
        let zeta = category(owner, "Zeta", Some(root.id), 1);
        let alpha = category(owner, "Alpha", Some(root.id), 1);
        let all = vec![late.clone(), root.clone(), zeta.clone(), alpha.clone()];

        let tree = build_tree(&all);
        let names: Vec<&str> = tree[0]
            .children
            .iter()
            .map(|n| n.category.name.as_str())
            .collect();

        assert_eq!(names, vec!["Alpha", "Zeta", "Late"]);
    }

    #[test]
    fn test_build_tree_promotes_orphans_to_roots() {
        let owner = Uuid::new_v4();
        let orphan = category(owner, "Orphan", Some(Uuid::new_v4()), 0);
        let child = category(owner, "Child", Some(orphan.id), 0);

        let tree = build_tree(&[orphan.clone(), child.clone()]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id(), orphan.id);
        assert_eq!(tree[0].level, 0);
        assert_eq!(tree[0].children[0].id(), child.id);
        assert_eq!(tree[0].children[0].level, 1);
    }

    #[test]
    fn test_build_tree_survives_cycles_without_losing_nodes() {
        let owner = Uuid::new_v4();
        let mut x = category(owner, "X", None, 0);
        let y = category(owner, "Y", Some(x.id), 0);
        x.parent_id = Some(y.id);
        let mut selfish = category(owner, "Self", None, 0);
        selfish.parent_id = Some(selfish.id);

        let all = vec![x, y, selfish];
        let flat = flatten_tree(&build_tree(&all));

        let mut got = ids(&flat);
        let mut want = ids(&all);
        got.sort();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn test_round_trip_preserves_identifier_set() {
        let owner = Uuid::new_v4();
        let mut all = Vec::new();
        for i in 0..6 {
            all.push(fake_category(owner, None, i));
        }
        for i in 0..12 {
            let parent = all[i % all.len()].id;
            all.push(fake_category(owner, Some(parent), i as i32));
        }
        all.push(fake_category(owner, Some(Uuid::new_v4()), 0));

        let flat = flatten_tree(&build_tree(&all));

        assert_eq!(flat.len(), all.len());
        let got: HashSet<Uuid> = flat.iter().map(|c| c.id).collect();
        let want: HashSet<Uuid> = all.iter().map(|c| c.id).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_category_path_three_levels() {
        let (all, _, _, c, _) = chain();
        let leaf = all.iter().find(|x| x.id == c).unwrap();

        assert_eq!(category_path(leaf, &all), "A > B > C");
        assert_eq!(category_path_by_id(c, &all).as_deref(), Some("A > B > C"));
        assert_eq!(category_path_by_id(Uuid::new_v4(), &all), None);
    }

    #[test]
    fn test_category_path_stops_at_unresolved_parent() {
        let owner = Uuid::new_v4();
        let orphan = category(owner, "Orphan", Some(Uuid::new_v4()), 0);
        let child = category(owner, "Child", Some(orphan.id), 0);
        let all = vec![orphan, child.clone()];

        assert_eq!(category_path(&child, &all), "Orphan > Child");
    }

    #[test]
    fn test_category_path_terminates_on_cycle() {
        let owner = Uuid::new_v4();
        let mut x = category(owner, "X", None, 0);
        let y = category(owner, "Y", Some(x.id), 0);
        x.parent_id = Some(y.id);
        let all = vec![x.clone(), y];

        let path = category_path(&x, &all);
        assert!(path.ends_with("X"));
        assert!(path.split(CATEGORY_PATH_SEPARATOR).count() <= all.len() + 1);
    }

    #[test]
    fn test_children_direct_only_sorted() {
        let owner = Uuid::new_v4();
        let root = category(owner, "Root", None, 0);
        let second = category(owner, "Second", Some(root.id), 2);
        let first = category(owner, "First", Some(root.id), 1);
        let grandchild = category(owner, "Grand", Some(first.id), 0);
        let all = vec![root.clone(), second.clone(), first.clone(), grandchild];

        assert_eq!(ids(&children(root.id, &all)), vec![first.id, second.id]);
        assert!(children(second.id, &all).is_empty());
    }

    #[test]
    fn test_descendants_breadth_first() {
        let owner = Uuid::new_v4();
        let root = category(owner, "Root", None, 0);
        let m = category(owner, "M", Some(root.id), 0);
        let n = category(owner, "N", Some(root.id), 1);
        let x = category(owner, "X", Some(m.id), 0);
        let y = category(owner, "Y", Some(x.id), 0);
        let all = vec![y.clone(), x.clone(), n.clone(), m.clone(), root.clone()];

        assert_eq!(ids(&descendants(root.id, &all)), vec![m.id, n.id, x.id, y.id]);
        assert!(descendants(y.id, &all).is_empty());
        assert!(descendants(Uuid::new_v4(), &all).is_empty());
    }

    #[test]
    fn test_descendants_terminates_on_cycle() {
        let owner = Uuid::new_v4();
        let mut x = category(owner, "X", None, 0);
        let y = category(owner, "Y", Some(x.id), 0);
        x.parent_id = Some(y.id);
        let all = vec![x.clone(), y.clone()];

        assert_eq!(ids(&descendants(x.id, &all)), vec![y.id]);
    }

    #[test]
    fn test_ids_including_descendants() {
        let (all, a, b, c, _) = chain();
        assert_eq!(ids_including_descendants(a, &all), vec![a, b, c]);
        assert_eq!(ids_including_descendants(c, &all), vec![c]);
    }

    #[test]
    fn test_ancestors_root_first() {
        let (all, a, b, c, d) = chain();

        assert_eq!(ids(&ancestors(c, &all)), vec![a, b]);
        assert!(ancestors(a, &all).is_empty());
        assert!(ancestors(d, &all).is_empty());
        assert!(ancestors(Uuid::new_v4(), &all).is_empty());
    }

    #[test]
    fn test_validate_move_rules() {
        let (all, a, b, c, d) = chain();

        let own = validate_move(a, Some(a), &all);
        assert!(!own.valid);
        assert_eq!(own.error.as_deref(), Some(ERR_OWN_PARENT));

        let grandchild = validate_move(a, Some(c), &all);
        assert!(!grandchild.valid);
        assert_eq!(grandchild.error.as_deref(), Some(ERR_OWN_DESCENDANT));

        assert!(validate_move(c, Some(d), &all).valid);
        assert!(validate_move(b, Some(d), &all).valid);
        assert!(validate_move(c, Some(a), &all).valid);
    }

    #[test]
    fn test_validate_move_to_root_always_valid() {
        let (all, a, b, c, d) = chain();
        for id in [a, b, c, d, Uuid::new_v4()] {
            assert_eq!(validate_move(id, None, &all), MoveValidation::ok());
        }
    }

    #[test]
    fn test_validate_move_never_admits_a_cycle() {
        let owner = Uuid::new_v4();
        let r = category(owner, "R", None, 0);
        let m = category(owner, "M", Some(r.id), 0);
        let x = category(owner, "X", Some(m.id), 0);
        let y = category(owner, "Y", Some(m.id), 1);
        let z = category(owner, "Z", Some(y.id), 0);
        let s = category(owner, "S", None, 1);
        let all = vec![r, m, x, y, z, s];

        for mover in &all {
            for target in all.iter().map(|c| Some(c.id)).chain([None]) {
                if !validate_move(mover.id, target, &all).valid {
                    continue;
                }
                let mut moved = all.clone();
                for c in moved.iter_mut().filter(|c| c.id == mover.id) {
                    c.parent_id = target;
                }
                for c in &moved {
                    assert!(
                        !ancestors(c.id, &moved).iter().any(|a| a.id == c.id),
                        "approved move created a cycle"
                    );
                    assert!(ancestors(c.id, &moved).len() < moved.len());
                }
                assert_eq!(flatten_tree(&build_tree(&moved)).len(), moved.len());
            }
        }
    }

    #[test]
    fn test_find_and_depth() {
        let (all, _, b, _, _) = chain();
        let tree = build_tree(&all);

        assert_eq!(find_in_tree(&tree, b).map(|n| n.level), Some(1));
        assert!(find_in_tree(&tree, Uuid::new_v4()).is_none());
        assert_eq!(max_tree_depth(&tree), 3);
        assert_eq!(max_tree_depth(&[]), 0);
    }

    #[test]
    fn test_filter_tree_keeps_ancestors_of_matches() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", None, 0);
        let drinks = category(owner, "Drinks", Some(food.id), 0);
        let mut tea = category(owner, "Tea", Some(drinks.id), 0);
        tea.description = Some("Green and black LEAVES".to_string());
        let snacks = category(owner, "Snacks", Some(food.id), 1);
        let tools = category(owner, "Tools", None, 1);
        let tree = build_tree(&[food.clone(), drinks.clone(), tea.clone(), snacks, tools]);

        let filtered = filter_tree(&tree, "leaves");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id(), food.id);
        assert_eq!(filtered[0].children.len(), 1);
        assert_eq!(filtered[0].children[0].id(), drinks.id);
        assert_eq!(filtered[0].children[0].children[0].id(), tea.id);
        assert_eq!(filtered[0].children[0].children[0].level, 2);

        let whole = filter_tree(&tree, "drink");
        assert_eq!(whole[0].children[0].children.len(), 1);

        assert_eq!(filter_tree(&tree, "  ").len(), 2);
        assert!(filter_tree(&tree, "nothing-like-this").is_empty());
    }

    #[test]
    fn test_next_display_order() {
        let owner = Uuid::new_v4();
        let root = category(owner, "Root", None, 3);
        let a = category(owner, "A", Some(root.id), 4);
        let b = category(owner, "B", Some(root.id), 9);
        let all = vec![root.clone(), a.clone(), b.clone()];

        assert_eq!(next_display_order(Some(root.id), &all, None), Some(10));
        assert_eq!(next_display_order(Some(root.id), &all, Some(b.id)), Some(5));
        assert_eq!(next_display_order(Some(a.id), &all, None), Some(0));
        assert_eq!(next_display_order(None, &all, None), Some(4));
    }

    #[test]
    fn test_next_display_order_at_i32_max() {
        let owner = Uuid::new_v4();
        let last = category(owner, "Last", None, i32::MAX);
        let first = category(owner, "First", None, 0);
        let all = vec![last.clone(), first];

        assert_eq!(next_display_order(None, &all, None), None);
        assert_eq!(next_display_order(None, &all, Some(last.id)), Some(1));
    }
}
