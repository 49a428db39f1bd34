//! Singly linked, mutable sequence of [`Object`]s.
//!
//! The same type holds literal list data, argument vectors and environments.
//! Nodes live in an arena owned by the list and link to each other by index,
//! so appending at the tail and pushing at the head are both O(1) without
//! shared mutable node pointers. Slots released by `pop_front`/`delete_nth`
//! are recycled by later insertions.

use std::fmt;
use std::iter::FusedIterator;

use crate::Error;
use crate::object::Object;

type NodeId = usize;

#[derive(Debug)]
struct Node {
    item: Object,
    next: Option<NodeId>,
}

/// Ordered sequence with O(1) `append`, O(1) `push` and O(1) `len`
#[derive(Default)]
pub struct List {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    count: usize,
}

/// Position of a live node; traversal follows `advance` links from [`List::first`]
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    list: &'a List,
    id: NodeId,
}

impl<'a> Cursor<'a> {
    /// The element under the cursor
    pub fn value(&self) -> &'a Object {
        &self.list.node(self.id).item
    }

    /// Cursor to the following node, if any
    pub fn advance(self) -> Option<Cursor<'a>> {
        self.list
            .node(self.id)
            .next
            .map(|id| Cursor { list: self.list, id })
    }
}

impl List {
    pub fn new() -> Self {
        List::default()
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id]
            .as_ref()
            .expect("list links only point at live nodes")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id]
            .as_mut()
            .expect("list links only point at live nodes")
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node {
        let node = self.nodes[id]
            .take()
            .expect("list links only point at live nodes");
        self.free.push(id);
        node
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Add at the tail, preserving existing order
    pub fn append(&mut self, item: Object) {
        let id = self.alloc(Node { item, next: None });
        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.count += 1;
    }

    /// Add at the head
    pub fn push(&mut self, item: Object) {
        let id = self.alloc(Node {
            item,
            next: self.head,
        });
        if self.tail.is_none() {
            self.tail = Some(id);
        }
        self.head = Some(id);
        self.count += 1;
    }

    /// Cursor to the head node, `None` when the list is empty
    pub fn first(&self) -> Option<Cursor<'_>> {
        self.head.map(|id| Cursor { list: self, id })
    }

    /// First element, if any
    pub fn front(&self) -> Option<&Object> {
        self.first().map(|cursor| cursor.value())
    }

    /// Element at `index`
    pub fn nth(&self, index: usize) -> Result<&Object, Error> {
        self.iter().nth(index).ok_or(Error::IndexError {
            index,
            len: self.count,
        })
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            at: self.head,
            remaining: self.count,
        }
    }

    /// New list holding every element but the first; `self` is unchanged
    pub fn rest(&self) -> List {
        self.copy_omit_nth(0)
    }

    /// Index of the first element structurally equal to `item`
    pub fn find(&self, item: &Object) -> Option<usize> {
        self.iter().position(|candidate| candidate == item)
    }

    /// Append every element of `other` that has no structural equal in `self` yet.
    /// Elements already present win; insertion order is preserved.
    pub fn add_missing(&mut self, other: &List) {
        for item in other {
            if self.find(item).is_none() {
                self.append(item.clone());
            }
        }
    }

    /// Shallow copy: closures and bindings stay shared with `self`
    pub fn copy(&self) -> List {
        self.iter().cloned().collect()
    }

    /// Copy without the element at index `n`
    pub fn copy_omit_nth(&self, n: usize) -> List {
        self.iter()
            .enumerate()
            .filter(|(i, _)| *i != n)
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Remove and return the head element
    pub fn pop_front(&mut self) -> Result<Object, Error> {
        let Some(head) = self.head else {
            return Err(Error::IndexError { index: 0, len: 0 });
        };
        let node = self.release(head);
        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.count -= 1;
        Ok(node.item)
    }

    /// Remove and return the element at index `n`
    pub fn delete_nth(&mut self, n: usize) -> Result<Object, Error> {
        if n >= self.count {
            return Err(Error::IndexError {
                index: n,
                len: self.count,
            });
        }
        if n == 0 {
            return self.pop_front();
        }

        let mut prev = self.head.expect("non-empty list has a head");
        for _ in 1..n {
            prev = self.node(prev).next.expect("index checked against count");
        }
        let target = self.node(prev).next.expect("index checked against count");
        let node = self.release(target);
        self.node_mut(prev).next = node.next;
        if self.tail == Some(target) {
            self.tail = Some(prev);
        }
        self.count -= 1;
        Ok(node.item)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.count = 0;
    }

    /// Walk the links and count nodes; must always equal `len()`
    #[cfg(test)]
    fn reachable(&self) -> usize {
        std::iter::successors(self.first(), |cursor| cursor.advance()).count()
    }
}

impl Clone for List {
    fn clone(&self) -> Self {
        self.copy()
    }
}

/// Structural equality; see [`Object`]'s `PartialEq` for the element rules
impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() && other.is_empty() {
            return true;
        }
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Parenthesised, space-separated rendering of the elements
impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, ")")
    }
}

impl FromIterator<Object> for List {
    fn from_iter<I: IntoIterator<Item = Object>>(iter: I) -> Self {
        let mut list = List::new();
        list.extend(iter);
        list
    }
}

impl Extend<Object> for List {
    fn extend<I: IntoIterator<Item = Object>>(&mut self, iter: I) {
        for item in iter {
            self.append(item);
        }
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Object;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator, head to tail
pub struct Iter<'a> {
    list: &'a List,
    at: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Object;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.at?;
        let node = self.list.node(id);
        self.at = node.next;
        self.remaining -= 1;
        Some(&node.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::object::{nil, sym, val};

    fn ints(values: &[i64]) -> List {
        values.iter().map(|n| Object::Int(*n)).collect()
    }

    fn assert_consistent(list: &List) {
        assert_eq!(list.reachable(), list.len(), "count drifted from links");
    }

    #[test]
    fn test_append_and_push_order() {
        let mut list = List::new();
        list.append(val(2));
        list.append(val(3));
        list.push(val(1));
        list.push(val(0));
        list.append(val(4));

        assert_eq!(list, ints(&[0, 1, 2, 3, 4]));
        assert_eq!(list.len(), 5);
        assert_consistent(&list);
    }

    #[test]
    fn test_push_onto_empty_sets_tail() {
        let mut list = List::new();
        list.push(val(1));
        list.append(val(2));
        assert_eq!(list, ints(&[1, 2]));
        assert_consistent(&list);
    }

    #[test]
    fn test_cursor_traversal() {
        let list = ints(&[10, 20, 30]);
        let mut seen = Vec::new();
        let mut cursor = list.first();
        while let Some(at) = cursor {
            seen.push(at.value().clone());
            cursor = at.advance();
        }
        assert_eq!(seen, vec![val(10), val(20), val(30)]);
        assert!(List::new().first().is_none());
    }

    #[test]
    fn test_rest_is_a_copy() {
        let list = ints(&[1, 2, 3]);
        let rest = list.rest();
        assert_eq!(rest, ints(&[2, 3]));
        assert_eq!(list, ints(&[1, 2, 3]));
        assert_eq!(List::new().rest().len(), 0);
    }

    #[test]
    fn test_find_uses_structural_equality() {
        let list: List = [sym("a"), val([1, 2]), val(3)].into_iter().collect();
        assert_eq!(list.find(&sym("a")), Some(0));
        assert_eq!(list.find(&val([1, 2])), Some(1));
        assert_eq!(list.find(&val(3)), Some(2));
        assert_eq!(list.find(&val(3.5)), None);
        assert_eq!(list.find(&val([1])), None);
    }

    #[test]
    fn test_add_missing_keeps_existing_entries() {
        let mut list = ints(&[1, 2]);
        list.add_missing(&ints(&[2, 3, 1, 4, 3]));
        assert_eq!(list, ints(&[1, 2, 3, 4]));
        assert_consistent(&list);
    }

    #[test]
    fn test_add_missing_bindings_first_symbol_wins() {
        let mut env: List = [Object::binding("x", val(1))].into_iter().collect();
        let other: List = [Object::binding("x", val(2)), Object::binding("y", val(3))]
            .into_iter()
            .collect();
        env.add_missing(&other);
        assert_eq!(env.len(), 2);
        assert_eq!(env.to_string(), "(x y)");
        match env.front().unwrap() {
            Object::Binding(binding) => assert_eq!(binding.borrow().value, val(1)),
            other => panic!("expected binding, got {other:?}"),
        }
    }

    #[test]
    fn test_copy_omit_nth() {
        let list = ints(&[1, 2, 3, 4]);
        assert_eq!(list.copy_omit_nth(0), ints(&[2, 3, 4]));
        assert_eq!(list.copy_omit_nth(2), ints(&[1, 2, 4]));
        assert_eq!(list.copy_omit_nth(9), list.copy());
    }

    #[test]
    fn test_pop_front_and_delete_nth() {
        let mut list = ints(&[1, 2, 3, 4]);
        assert_eq!(list.pop_front().unwrap(), val(1));
        assert_eq!(list.delete_nth(2).unwrap(), val(4));
        assert_consistent(&list);
        // Tail was fixed up, so appending lands after 3
        list.append(val(5));
        assert_eq!(list, ints(&[2, 3, 5]));
        assert_eq!(list.delete_nth(1).unwrap(), val(3));
        assert_eq!(list, ints(&[2, 5]));
        assert_consistent(&list);
    }

    #[test]
    fn test_out_of_range_is_index_error() {
        let mut list = ints(&[1]);
        assert_eq!(
            list.nth(3).unwrap_err(),
            Error::IndexError { index: 3, len: 1 }
        );
        assert_eq!(
            list.delete_nth(1).unwrap_err(),
            Error::IndexError { index: 1, len: 1 }
        );
        list.pop_front().unwrap();
        assert_eq!(
            list.pop_front().unwrap_err(),
            Error::IndexError { index: 0, len: 0 }
        );
        assert!(list.is_empty());
        assert_consistent(&list);
    }

    #[test]
    fn test_released_slots_are_reused() {
        let mut list = ints(&[1, 2, 3]);
        list.pop_front().unwrap();
        list.pop_front().unwrap();
        list.append(val(4));
        list.push(val(0));
        assert_eq!(list.nodes.len(), 3);
        assert_eq!(list, ints(&[0, 3, 4]));
        assert_consistent(&list);
    }

    #[test]
    fn test_clear() {
        let mut list = ints(&[1, 2, 3]);
        list.clear();
        assert!(list.is_empty());
        assert!(list.first().is_none());
        list.append(val(7));
        assert_eq!(list, ints(&[7]));
    }

    #[test]
    fn test_equality_and_display() {
        assert_eq!(List::new(), List::new());
        assert_ne!(ints(&[1]), List::new());
        assert_ne!(ints(&[1, 2]), ints(&[1, 2, 3]));
        assert_eq!(ints(&[1, 2]), ints(&[1, 2]));
        assert_eq!(ints(&[1, 2, 3]).to_string(), "(1 2 3)");
        assert_eq!(List::new().to_string(), "()");
        let nested: List = [val(1), nil(), val([2, 3])].into_iter().collect();
        assert_eq!(nested.to_string(), "(1 () (2 3))");
    }

    #[test]
    fn test_iter_is_exact_size() {
        let list = ints(&[1, 2, 3]);
        let mut iter = list.iter();
        assert_eq!(iter.len(), 3);
        iter.next();
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.by_ref().count(), 2);
        assert!(iter.next().is_none());
    }
}
