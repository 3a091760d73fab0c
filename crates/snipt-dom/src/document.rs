//! Arena-backed document tree.
//!
//! Nodes are never freed: removing a node only detaches it, so a `NodeId`
//! held across an await stays valid and `is_connected` tells whether the
//! node is still part of the page.

use crate::editor::EditorHandle;
use crate::error::{DomError, Result};
use crate::event::{Event, EventKind, EventListener, HostTask, ListenerId};
use crate::fragment::Fragment;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Shared handle the engine and the host page both hold
pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A point in the tree: a char offset in a text node, or a child index in an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Value and selection state of an `input` or `textarea`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormControl {
    pub value: String,
    pub selection_start: usize,
    pub selection_end: usize,
}

struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    form: Option<FormControl>,
    shadow_root: bool,
    editor: Option<EditorHandle>,
}

enum NodeKind {
    Element(ElementData),
    Text(String),
}

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

struct Registration {
    id: ListenerId,
    target: Option<NodeId>,
    listener: Box<dyn EventListener>,
}

pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    selection: Option<Range>,
    active_element: Option<NodeId>,
    listeners: Vec<Registration>,
    removed_during_dispatch: Vec<ListenerId>,
    next_listener_id: u64,
    host_tasks: VecDeque<HostTask>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("body", &self.inner_html(self.body))
            .field("selection", &self.selection)
            .field("active_element", &self.active_element)
            .field("listeners", &self.listeners.len())
            .field("host_tasks", &self.host_tasks.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn is_form_tag(tag: &str) -> bool {
    tag == "input" || tag == "textarea"
}

impl Document {
    pub fn new() -> Self {
        let body = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element(ElementData {
                tag: "body".to_string(),
                attributes: Vec::new(),
                form: None,
                shadow_root: false,
                editor: None,
            }),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            selection: None,
            active_element: None,
            listeners: Vec::new(),
            removed_during_dispatch: Vec::new(),
            next_listener_id: 0,
            host_tasks: VecDeque::new(),
        }
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    // ---- construction -------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let form = is_form_tag(&tag).then(FormControl::default);
        self.push_node(NodeKind::Element(ElementData {
            tag,
            attributes: Vec::new(),
            form,
            shadow_root: false,
            editor: None,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Build a detached subtree from a fragment
    pub fn build(&mut self, fragment: &Fragment) -> NodeId {
        match fragment {
            Fragment::Text(text) => self.create_text(text),
            Fragment::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.create_element(tag);
                if let Ok(element) = self.element_mut(id) {
                    element.attributes = attributes.clone();
                }
                for child in children {
                    let child_id = self.build(child);
                    self.nodes[child_id.0].parent = Some(id);
                    self.nodes[id.0].children.push(child_id);
                }
                id
            }
        }
    }

    /// Snapshot a subtree as a fragment
    pub fn to_fragment(&self, id: NodeId) -> Result<Fragment> {
        let node = self.node(id)?;
        Ok(match &node.kind {
            NodeKind::Text(text) => Fragment::Text(text.clone()),
            NodeKind::Element(data) => Fragment::Element {
                tag: data.tag.clone(),
                attributes: data.attributes.clone(),
                children: node
                    .children
                    .iter()
                    .map(|child| self.to_fragment(*child))
                    .collect::<Result<Vec<_>>>()?,
            },
        })
    }

    /// Snapshot the children of a node
    pub fn children_fragments(&self, id: NodeId) -> Result<Vec<Fragment>> {
        self.node(id)?
            .children
            .iter()
            .map(|child| self.to_fragment(*child))
            .collect()
    }

    // ---- tree structure -----------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Ancestors from the parent upward
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.ancestors(id).contains(&ancestor)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    fn detach(&mut self, child: NodeId) -> Result<()> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`, or at the end
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        self.element(parent)?;
        if self.contains(child, parent) {
            return Err(DomError::HierarchyViolation { child });
        }
        self.detach(child)?;

        let siblings = &self.node(parent)?.children;
        let index = match reference {
            Some(reference) => siblings
                .iter()
                .position(|c| *c == reference)
                .ok_or(DomError::UnknownNode(reference))?,
            None => siblings.len(),
        };

        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        if self.active_element.is_some_and(|active| self.contains(id, active)) {
            self.active_element = None;
        }
        Ok(())
    }

    /// Swap all children of `parent` for freshly built fragments
    pub fn replace_children(&mut self, parent: NodeId, fragments: &[Fragment]) -> Result<Vec<NodeId>> {
        self.element(parent)?;
        let old = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in old {
            self.node_mut(child)?.parent = None;
        }
        self.drop_stale_selection();

        let mut built = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let id = self.build(fragment);
            self.append_child(parent, id)?;
            built.push(id);
        }
        Ok(built)
    }

    /// Swap `node` for freshly built fragments at the same position
    pub fn replace_with(&mut self, node: NodeId, fragments: &[Fragment]) -> Result<Vec<NodeId>> {
        let parent = self.parent(node).ok_or(DomError::Detached(node))?;
        let mut built = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let id = self.build(fragment);
            self.insert_before(parent, id, Some(node))?;
            built.push(id);
        }
        self.detach(node)?;
        self.drop_stale_selection();
        Ok(built)
    }

    fn drop_stale_selection(&mut self) {
        if let Some(range) = self.selection {
            if !self.is_connected(range.start.node) || !self.is_connected(range.end.node) {
                self.selection = None;
            }
        }
    }

    // ---- element data -------------------------------------------------

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_ok()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).map(|n| &n.kind), Ok(NodeKind::Text(_)))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).ok().map(|element| element.tag.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .ok()?
            .attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|element| element.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self.element_mut(id)?;
        match element
            .attributes
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => element.attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.element_mut(id)?
            .attributes
            .retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        Ok(())
    }

    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|classes| classes.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_list(id).contains(&class)
    }

    pub fn attach_shadow(&mut self, id: NodeId) -> Result<()> {
        self.element_mut(id)?.shadow_root = true;
        Ok(())
    }

    pub fn has_shadow_root(&self, id: NodeId) -> bool {
        self.element(id).map(|element| element.shadow_root).unwrap_or(false)
    }

    pub fn set_editor(&mut self, id: NodeId, editor: EditorHandle) -> Result<()> {
        self.element_mut(id)?.editor = Some(editor);
        Ok(())
    }

    pub fn editor(&self, id: NodeId) -> Option<EditorHandle> {
        self.element(id).ok()?.editor.clone()
    }

    /// The element carries `contenteditable` in an editing state itself
    pub fn is_editing_host(&self, id: NodeId) -> bool {
        matches!(
            self.attribute(id, "contenteditable").map(str::to_ascii_lowercase).as_deref(),
            Some("" | "true" | "plaintext-only")
        )
    }

    /// Content of the element can be edited by the user
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|node| {
                self.attribute(node, "contenteditable")
                    .map(|value| value.eq_ignore_ascii_case("false"))
                    .map(|disabled| !disabled)
            })
            .unwrap_or(false)
    }

    /// The element that hosts editing for `id`, walking up from it
    pub fn editing_host(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|node| self.is_element(*node))
            .take_while(|node| {
                self.attribute(*node, "contenteditable")
                    .map_or(true, |value| !value.eq_ignore_ascii_case("false"))
            })
            .filter(|node| self.is_editing_host(*node))
            .last()
    }

    // ---- text ---------------------------------------------------------

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|text| text.chars().count()).unwrap_or(0)
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(text) => {
                *text = value.to_string();
            }
            NodeKind::Element(_) => return Err(DomError::NotAText(id)),
        }
        if let Some(range) = self.selection {
            let len = self.text_len(id);
            let clamp = |p: Position| {
                if p.node == id {
                    Position::new(id, p.offset.min(len))
                } else {
                    p
                }
            };
            self.selection = Some(Range::new(clamp(range.start), clamp(range.end)));
        }
        Ok(())
    }

    /// Text nodes below `root` in document order
    pub fn text_nodes(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_text_nodes(root, &mut out);
        out
    }

    fn collect_text_nodes(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.is_text(id) {
            out.push(id);
            return;
        }
        for child in self.children(id) {
            self.collect_text_nodes(*child, out);
        }
    }

    /// Concatenated text of every text node below `root`
    pub fn text_content(&self, root: NodeId) -> String {
        self.text_nodes(root)
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, root: NodeId, text: &str) -> Result<()> {
        if text.is_empty() {
            self.replace_children(root, &[])?;
        } else {
            self.replace_children(root, &[Fragment::text(text)])?;
        }
        Ok(())
    }

    /// Markup of the children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        self.children_fragments(id)
            .map(|fragments| crate::fragment::render_html(&fragments))
            .unwrap_or_default()
    }

    // ---- form controls ------------------------------------------------

    pub fn is_form_control(&self, id: NodeId) -> bool {
        self.element(id).map(|element| element.form.is_some()).unwrap_or(false)
    }

    fn form(&self, id: NodeId) -> Result<&FormControl> {
        self.element(id)?
            .form
            .as_ref()
            .ok_or(DomError::NotAFormControl(id))
    }

    fn form_mut(&mut self, id: NodeId) -> Result<&mut FormControl> {
        self.element_mut(id)?
            .form
            .as_mut()
            .ok_or(DomError::NotAFormControl(id))
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.form(id).ok().map(|form| form.value.as_str())
    }

    /// Set the value; the caret moves to the end like a browser does
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        let form = self.form_mut(id)?;
        form.value = value.to_string();
        let end = form.value.chars().count();
        form.selection_start = end;
        form.selection_end = end;
        Ok(())
    }

    pub fn selection_range(&self, id: NodeId) -> Option<(usize, usize)> {
        self.form(id)
            .ok()
            .map(|form| (form.selection_start, form.selection_end))
    }

    pub fn set_selection_range(&mut self, id: NodeId, start: usize, end: usize) -> Result<()> {
        let form = self.form_mut(id)?;
        let len = form.value.chars().count();
        if start > len || end > len {
            return Err(DomError::OffsetOutOfRange {
                node: id,
                offset: start.max(end),
                len,
            });
        }
        form.selection_start = start.min(end);
        form.selection_end = end.max(start);
        Ok(())
    }

    // ---- selection and focus ------------------------------------------

    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    fn check_position(&self, position: Position) -> Result<()> {
        let node = self.node(position.node)?;
        let len = match &node.kind {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Element(_) => node.children.len(),
        };
        if position.offset > len {
            return Err(DomError::OffsetOutOfRange {
                node: position.node,
                offset: position.offset,
                len,
            });
        }
        if !self.is_connected(position.node) {
            return Err(DomError::Detached(position.node));
        }
        Ok(())
    }

    pub fn set_selection(&mut self, range: Range) -> Result<()> {
        self.check_position(range.start)?;
        self.check_position(range.end)?;
        self.selection = Some(range);
        Ok(())
    }

    pub fn collapse(&mut self, at: Position) -> Result<()> {
        self.set_selection(Range::collapsed(at))
    }

    /// Collapse the selection after the last child of `id`
    pub fn collapse_to_end(&mut self, id: NodeId) -> Result<()> {
        let len = self.node(id)?.children.len();
        self.collapse(Position::new(id, len))
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Text covered by the live selection
    pub fn selected_text(&self) -> Option<String> {
        let range = self.selection?;
        if range.start.node == range.end.node && self.is_text(range.start.node) {
            let text = self.text(range.start.node)?;
            return Some(
                text.chars()
                    .skip(range.start.offset)
                    .take(range.end.offset.saturating_sub(range.start.offset))
                    .collect(),
            );
        }
        None
    }

    pub fn focus(&mut self, id: NodeId) -> Result<()> {
        self.element(id)?;
        if !self.is_connected(id) {
            return Err(DomError::Detached(id));
        }
        self.active_element = Some(id);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.active_element = None;
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    // ---- text projection offsets --------------------------------------

    /// Offset of a tree position within the text projection of `root`
    pub fn offset_in(&self, root: NodeId, position: Position) -> Option<usize> {
        if !self.contains(root, position.node) {
            return None;
        }

        if self.is_text(position.node) {
            let mut offset = 0;
            for text_node in self.text_nodes(root) {
                if text_node == position.node {
                    return Some(offset + position.offset);
                }
                offset += self.text_len(text_node);
            }
            return None;
        }

        // text nodes before an element boundary form a prefix in document order
        let children = self.children(position.node);
        let before: Vec<NodeId> = children[..position.offset.min(children.len())]
            .iter()
            .flat_map(|child| self.text_nodes(*child))
            .collect();
        let inside = self.text_nodes(position.node);

        let mut offset = 0;
        for text_node in self.text_nodes(root) {
            if inside.contains(&text_node) && !before.contains(&text_node) {
                break;
            }
            if !inside.contains(&text_node) && self.precedes(position.node, text_node) {
                break;
            }
            offset += self.text_len(text_node);
        }
        Some(offset)
    }

    /// `node` comes before `other` in document order and does not contain it
    fn precedes(&self, node: NodeId, other: NodeId) -> bool {
        let path = |id: NodeId| {
            let mut chain: Vec<NodeId> = self.ancestors(id);
            chain.reverse();
            chain.push(id);
            chain
        };
        let (a, b) = (path(node), path(other));
        let shared = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
        match (a.get(shared), b.get(shared), shared.checked_sub(1).and_then(|i| a.get(i))) {
            (Some(x), Some(y), Some(parent)) => {
                let siblings = self.children(*parent);
                let ix = siblings.iter().position(|c| c == x);
                let iy = siblings.iter().position(|c| c == y);
                ix < iy
            }
            _ => false,
        }
    }

    /// Tree position for an offset in the text projection of `root`.
    /// A boundary between two text nodes resolves to the end of the first.
    pub fn position_at(&self, root: NodeId, offset: usize) -> Option<Position> {
        let mut consumed = 0;
        for text_node in self.text_nodes(root) {
            let len = self.text_len(text_node);
            if offset <= consumed + len {
                return Some(Position::new(text_node, offset - consumed));
            }
            consumed += len;
        }
        if offset == consumed && self.is_element(root) {
            return Some(Position::new(root, self.children(root).len()));
        }
        None
    }

    // ---- events -------------------------------------------------------

    /// Register a listener on a node, or on the document when `target` is `None`
    pub fn add_event_listener(
        &mut self,
        target: Option<NodeId>,
        listener: impl EventListener + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push(Registration {
            id,
            target,
            listener: Box::new(listener),
        });
        id
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) {
        let before = self.listeners.len();
        self.listeners.retain(|registration| registration.id != id);
        if self.listeners.len() == before {
            self.removed_during_dispatch.push(id);
        }
    }

    /// Dispatch from `target` up through its ancestors to the document.
    /// Returns `false` when a listener prevented the default.
    ///
    /// Listeners run with the document borrowed mutably; events they
    /// dispatch themselves do not reach other listeners.
    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind, cancelable: bool) -> bool {
        let mut event = Event::new(target, kind, cancelable);
        let path: Vec<Option<NodeId>> = std::iter::once(target)
            .chain(self.ancestors(target))
            .map(Some)
            .chain(std::iter::once(None))
            .collect();

        tracing::trace!(event = event.kind.name(), ?target, "dispatching");

        let mut listeners = std::mem::take(&mut self.listeners);
        'path: for hop in path {
            event.current_target = hop;
            for registration in listeners.iter_mut().filter(|r| r.target == hop) {
                if self.removed_during_dispatch.contains(&registration.id) {
                    continue;
                }
                registration.listener.handle_event(self, &mut event);
                if event.propagation_stopped() {
                    break 'path;
                }
            }
        }

        listeners.append(&mut self.listeners);
        let removed = std::mem::take(&mut self.removed_during_dispatch);
        listeners.retain(|registration| !removed.contains(&registration.id));
        self.listeners = listeners;

        !event.default_prevented()
    }

    // ---- host tasks ---------------------------------------------------

    pub fn queue_host_task(&mut self, task: impl FnOnce(&mut Document) + Send + 'static) {
        let task: HostTask = Box::new(task);
        self.host_tasks.push_back(task);
    }

    pub fn pending_host_tasks(&self) -> usize {
        self.host_tasks.len()
    }

    /// Run queued host tasks, including ones queued while running
    pub fn run_host_tasks(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.host_tasks.pop_front() {
            task(self);
            ran += 1;
        }
        ran
    }
}
