//! FILENAME: core/pivot-engine/src/grouping.rs
//! Grouping Stage - partitions the working rows into a header tree.
//!
//! Called once for the row fields and once for the column fields. Each level
//! partitions its parent's rows by the string coercion of one field; blank
//! values (null, missing or whitespace) share one "(blank)" bucket.
//!
//! Node keys encode the full path as `field U+001E value` segments joined by
//! U+001F, so equal values under different fields never collide.

use rustc_hash::FxHashMap;

use crate::definition::{PivotFieldConfig, SortOrder};
use crate::result::{HeaderNode, OriginalValues};
use crate::value::{FieldValue, Row, RowId};

pub const GRAND_TOTAL_KEY: &str = "__grand_total__";
pub const GRAND_TOTAL_LABEL: &str = "Grand Total";
pub const BLANK_LABEL: &str = "(blank)";
pub const SUBTOTAL_SEGMENT: &str = "__subtotal__";

const FIELD_SEPARATOR: char = '\u{1e}';
const PATH_SEPARATOR: char = '\u{1f}';

/// Key of the child `field = value` under `parent`.
pub fn child_key(parent: Option<&str>, field: &str, value: &str) -> String {
    let mut key = String::with_capacity(
        parent.map_or(0, |p| p.len() + 1) + field.len() + value.len() + 1,
    );
    if let Some(parent) = parent {
        key.push_str(parent);
        key.push(PATH_SEPARATOR);
    }
    key.push_str(field);
    key.push(FIELD_SEPARATOR);
    key.push_str(value);
    key
}

/// Key of the subtotal node of `parent_key`.
pub fn subtotal_key(parent_key: &str) -> String {
    format!("{}{}{}", parent_key, PATH_SEPARATOR, SUBTOTAL_SEGMENT)
}

/// A header tree plus the row membership of each of its nodes.
#[derive(Debug, Clone, Default)]
pub struct GroupTree {
    pub nodes: Vec<HeaderNode>,
    /// Node key -> member row ids, for every node (parents hold the union).
    pub membership: FxHashMap<String, Vec<RowId>>,
    /// Row id -> key of the leaf that holds it.
    pub leaf_of: FxHashMap<RowId, String>,
}

impl GroupTree {
    /// True for the single "all rows" root built when no fields are configured.
    pub fn is_implicit_root(&self) -> bool {
        matches!(self.nodes.as_slice(), [only] if only.is_grand_total)
    }

    pub fn members(&self, key: &str) -> &[RowId] {
        self.membership.get(key).map_or(&[], Vec::as_slice)
    }
}

impl HeaderNode {
    /// The grand-total node of an axis.
    pub fn grand_total() -> Self {
        HeaderNode {
            key: GRAND_TOTAL_KEY.to_string(),
            label: GRAND_TOTAL_LABEL.to_string(),
            level: 0,
            children: Vec::new(),
            is_subtotal: false,
            is_grand_total: true,
            original_values: OriginalValues::new(),
        }
    }
}

/// Builds the header tree of one axis.
///
/// With no fields the tree is a single implicit root covering every row; it
/// doubles as the axis' grand-total node.
pub fn build_group_tree(rows: &[&Row], fields: &[PivotFieldConfig]) -> GroupTree {
    let mut tree = GroupTree::default();

    if fields.is_empty() {
        let members: Vec<RowId> = rows.iter().map(|r| r.id).collect();
        for id in &members {
            tree.leaf_of.insert(*id, GRAND_TOTAL_KEY.to_string());
        }
        tree.membership.insert(GRAND_TOTAL_KEY.to_string(), members);
        tree.nodes.push(HeaderNode::grand_total());
        return tree;
    }

    tree.nodes = build_level(rows, fields, 0, None, &OriginalValues::new(), &mut tree);
    tree
}

/// One partition bucket: coerced value, first seen value, members.
struct Bucket<'r> {
    key_value: String,
    value: FieldValue,
    rows: Vec<&'r Row>,
}

fn build_level(
    rows: &[&Row],
    fields: &[PivotFieldConfig],
    level: usize,
    parent_key: Option<&str>,
    parent_values: &OriginalValues,
    tree: &mut GroupTree,
) -> Vec<HeaderNode> {
    let field = &fields[level];
    let is_leaf_level = level + 1 == fields.len();

    let mut buckets = partition(rows, &field.field);
    sort_buckets(&mut buckets, field.sort_order);

    let mut nodes = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        let key = child_key(parent_key, &field.field, &bucket.key_value);
        let label = if bucket.key_value.is_empty() {
            BLANK_LABEL.to_string()
        } else {
            bucket.key_value
        };

        let mut original_values = parent_values.clone();
        original_values.push((field.field.clone(), bucket.value));

        let members: Vec<RowId> = bucket.rows.iter().map(|r| r.id).collect();
        let children = if is_leaf_level {
            for id in &members {
                tree.leaf_of.insert(*id, key.clone());
            }
            Vec::new()
        } else {
            build_level(&bucket.rows, fields, level + 1, Some(&key), &original_values, tree)
        };
        tree.membership.insert(key.clone(), members);

        nodes.push(HeaderNode {
            key,
            label,
            level,
            children,
            is_subtotal: false,
            is_grand_total: false,
            original_values,
        });
    }

    nodes
}

/// Partitions rows by the coerced value of `field`, in order of first appearance.
fn partition<'r>(rows: &[&'r Row], field: &str) -> Vec<Bucket<'r>> {
    let mut buckets: Vec<Bucket<'r>> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for &row in rows {
        let value = row.get(field);
        let key_value = value.group_key();

        match index.get(&key_value) {
            Some(&i) => buckets[i].rows.push(row),
            None => {
                index.insert(key_value.clone(), buckets.len());
                let value = if key_value.is_empty() {
                    FieldValue::Null
                } else {
                    value.clone()
                };
                buckets.push(Bucket {
                    key_value,
                    value,
                    rows: vec![row],
                });
            }
        }
    }

    buckets
}

/// Lexical order of the coerced value. The blank bucket ("") sorts first
/// ascending. Sorts are stable.
fn sort_buckets(buckets: &mut [Bucket<'_>], sort_order: SortOrder) {
    match sort_order {
        SortOrder::Ascending => buckets.sort_by(|a, b| a.key_value.cmp(&b.key_value)),
        SortOrder::Descending => buckets.sort_by(|a, b| b.key_value.cmp(&a.key_value)),
        SortOrder::DataSourceOrder => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::new(0).with("region", "West").with("cat", "B"),
            Row::new(1).with("region", "East").with("cat", "A"),
            Row::new(2).with("region", "East").with("cat", "B"),
            Row::new(3).with("cat", "A"),
            Row::new(4).with("region", "  ").with("cat", "A"),
        ]
    }

    fn labels(nodes: &[HeaderNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.label.as_str()).collect()
    }

    #[test]
    fn test_empty_fields_build_implicit_root() {
        let rows = rows();
        let refs: Vec<&Row> = rows.iter().collect();
        let tree = build_group_tree(&refs, &[]);

        assert!(tree.is_implicit_root());
        assert_eq!(tree.nodes[0].key, GRAND_TOTAL_KEY);
        assert_eq!(tree.members(GRAND_TOTAL_KEY), &[0, 1, 2, 3, 4]);
        assert_eq!(tree.leaf_of[&3], GRAND_TOTAL_KEY);
    }

    #[test]
    fn test_blank_values_share_one_bucket_sorted_first() {
        let rows = rows();
        let refs: Vec<&Row> = rows.iter().collect();
        let tree = build_group_tree(&refs, &[PivotFieldConfig::new("region")]);

        assert_eq!(labels(&tree.nodes), vec![BLANK_LABEL, "East", "West"]);
        assert_eq!(tree.members(&tree.nodes[0].key), &[3, 4]);
        assert_eq!(tree.nodes[0].original_values[0].1, FieldValue::Null);
    }

    #[test]
    fn test_sort_orders() {
        let rows = rows();
        let refs: Vec<&Row> = rows.iter().collect();

        let desc = build_group_tree(
            &refs,
            &[PivotFieldConfig::new("region").sorted(SortOrder::Descending)],
        );
        assert_eq!(labels(&desc.nodes), vec!["West", "East", BLANK_LABEL]);

        let source = build_group_tree(
            &refs,
            &[PivotFieldConfig::new("region").sorted(SortOrder::DataSourceOrder)],
        );
        assert_eq!(labels(&source.nodes), vec!["West", "East", BLANK_LABEL]);
    }

    #[test]
    fn test_nested_levels_and_membership() {
        let rows = rows();
        let refs: Vec<&Row> = rows.iter().collect();
        let fields = [PivotFieldConfig::new("region"), PivotFieldConfig::new("cat")];
        let tree = build_group_tree(&refs, &fields);

        let east = &tree.nodes[1];
        assert_eq!(east.level, 0);
        assert_eq!(labels(&east.children), vec!["A", "B"]);
        assert_eq!(east.children[0].level, 1);
        assert_eq!(tree.members(&east.key), &[1, 2]);
        assert_eq!(tree.members(&east.children[1].key), &[2]);
        assert_eq!(tree.leaf_of[&2], east.children[1].key);
        assert_eq!(
            east.children[1].original_values.as_slice(),
            &[
                ("region".to_string(), FieldValue::from("East")),
                ("cat".to_string(), FieldValue::from("B")),
            ]
        );
    }

    #[test]
    fn test_every_row_lands_in_exactly_one_leaf() {
        let rows = rows();
        let refs: Vec<&Row> = rows.iter().collect();
        let fields = [PivotFieldConfig::new("region"), PivotFieldConfig::new("cat")];
        let tree = build_group_tree(&refs, &fields);

        assert_eq!(tree.leaf_of.len(), rows.len());
        let leaf_total: usize = tree
            .nodes
            .iter()
            .flat_map(|n| n.children.iter())
            .map(|leaf| tree.members(&leaf.key).len())
            .sum();
        assert_eq!(leaf_total, rows.len());
    }

    #[test]
    fn test_keys_are_injective_across_fields() {
        let a = child_key(None, "a", "x");
        let b = child_key(None, "b", "x");
        assert_ne!(a, b);

        let region_east = child_key(None, "region", "East");
        let cat_east = child_key(None, "cat", "East");
        assert_ne!(
            child_key(Some(&region_east), "cat", "A"),
            child_key(Some(&cat_east), "cat", "A")
        );
        assert_ne!(subtotal_key(&a), child_key(Some(&a), "__subtotal__", ""));
    }

    #[test]
    fn test_numbers_and_text_with_same_string_form_merge() {
        let rows = vec![
            Row::new(0).with("year", 2024.0),
            Row::new(1).with("year", "2024"),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        let tree = build_group_tree(&refs, &[PivotFieldConfig::new("year")]);
        assert_eq!(labels(&tree.nodes), vec!["2024"]);
        assert_eq!(tree.members(&tree.nodes[0].key), &[0, 1]);
    }
}
