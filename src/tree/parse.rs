use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::model::{RawNode, assemble};

/// Fields of one node. `children` is split off before deserializing so that
/// nesting never recurses through serde.
#[derive(Debug, Deserialize)]
struct WireNode {
    #[serde(default, alias = "node_id")]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default, alias = "modalContentComponent")]
    detail_kind: Option<String>,
    #[serde(default)]
    detail_payload: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Where a node sits: its parent's preorder position and its index among the
/// parent's children. Paths for error messages are rebuilt from these.
#[derive(Clone, Copy)]
struct Slot {
    parent: usize,
    position: usize,
}

pub fn parse_tree(raw: &str) -> Result<RawNode> {
    let parsed = parse_value(raw).context("invalid JSON tree")?;
    let root_value = match parsed {
        Value::Object(mut object) if object.contains_key("tree") && !object.contains_key("id") => {
            let tree = object.remove("tree").unwrap_or(Value::Null);
            dismantle(vec![Value::Object(object)]);
            tree
        }
        other => other,
    };

    if !root_value.is_object() {
        dismantle(vec![root_value]);
        return Err(anyhow!("tree root must be a JSON object"));
    }

    convert(root_value)
}

/// Parses without serde_json's nesting limit; the stack grows on demand.
fn parse_value(raw: &str) -> serde_json::Result<Value> {
    let mut json = serde_json::Deserializer::from_str(raw);
    json.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

/// Converts the wire tree in preorder with an explicit stack.
fn convert(root_value: Value) -> Result<RawNode> {
    let (root, root_children) = read_node(root_value, &[], None)?;

    let mut slots: Vec<Slot> = Vec::new();
    let mut descendants: Vec<(RawNode, usize)> = Vec::new();
    let mut pending = pending_children(root_children, 0);

    while let Some((value, slot)) = pending.pop() {
        match read_node(value, &slots, Some(slot)) {
            Ok((node, children)) => {
                descendants.push((node, slot.parent));
                slots.push(slot);
                pending.extend(pending_children(children, descendants.len()));
            }
            Err(error) => {
                dismantle(pending.into_iter().map(|(value, _)| value).collect());
                return Err(error);
            }
        }
    }

    Ok(assemble(root, descendants))
}

/// Children in reverse so that popping visits them first to last.
fn pending_children(children: Vec<Value>, parent: usize) -> Vec<(Value, Slot)> {
    children
        .into_iter()
        .enumerate()
        .rev()
        .map(|(position, value)| (value, Slot { parent, position }))
        .collect()
}

/// Reads one node and hands back its still unconverted children.
fn read_node(value: Value, slots: &[Slot], slot: Option<Slot>) -> Result<(RawNode, Vec<Value>)> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            dismantle(vec![other]);
            return Err(anyhow!("node at {} must be a JSON object", node_path(slots, slot)));
        }
    };

    let children = match object.remove("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(children)) => children,
        Some(other) => {
            dismantle(vec![other, Value::Object(object)]);
            return Err(anyhow!(
                "children of node at {} must be an array",
                node_path(slots, slot)
            ));
        }
    };

    let wire = match WireNode::deserialize(Value::Object(object)) {
        Ok(wire) => wire,
        Err(error) => {
            let context = format!("node at {} does not match node shape", node_path(slots, slot));
            dismantle(children);
            return Err(anyhow::Error::new(error).context(context));
        }
    };

    let Some(id) = wire.id.filter(|id| !id.is_empty()) else {
        dismantle(children);
        return Err(anyhow!("node at {} has no id", node_path(slots, slot)));
    };

    let detail_kind = wire.detail_kind.filter(|kind| !kind.is_empty());

    // Nodes without an explicit payload hand their remaining fields to the detail view.
    let detail_payload = match wire.detail_payload {
        Some(payload) => payload,
        None if detail_kind.is_some() && !wire.extra.is_empty() => Value::Object(wire.extra),
        None => Value::Null,
    };

    let name = if wire.name.is_empty() {
        id.clone()
    } else {
        wire.name
    };

    let node = RawNode {
        id,
        name,
        value: wire.value,
        children: Vec::with_capacity(children.len()),
        detail_kind,
        detail_payload,
    };
    Ok((node, children))
}

/// `$` for the root, `$.children[i].children[j]…` below it.
fn node_path(slots: &[Slot], slot: Option<Slot>) -> String {
    let mut positions = Vec::new();
    let mut cursor = slot;
    while let Some(Slot { parent, position }) = cursor {
        positions.push(position);
        cursor = parent.checked_sub(1).map(|index| slots[index]);
    }

    let mut path = String::from("$");
    for position in positions.iter().rev() {
        path.push_str(&format!(".children[{position}]"));
    }
    path
}

/// Drops nested values one level at a time instead of recursively.
fn dismantle(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(fields) => pending.extend(fields.into_iter().map(|(_, value)| value)),
            _ => {}
        }
    }
}
