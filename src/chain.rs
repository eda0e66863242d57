use std::sync::Arc;

use crate::record::Attr;

/// One element of a [`ContextChain`]: either a group name opened by
/// `with_group` or the batch of attributes bound by one `with_attrs` call.
#[derive(Debug, Clone)]
pub enum GroupOrAttrs {
    Group(String),
    Attrs(Vec<Attr>),
}

impl GroupOrAttrs {
    pub fn is_group(&self) -> bool {
        matches!(self, GroupOrAttrs::Group(_))
    }
}

#[derive(Debug)]
struct Node {
    item: GroupOrAttrs,
    parent: Option<Arc<Node>>,
    len: usize,
}

// Unlink ancestors iteratively; the derived drop would recurse once per node.
impl Drop for Node {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            match Arc::try_unwrap(node) {
                Ok(mut node) => parent = node.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// Immutable, append-only sequence of bound groups and attribute batches.
///
/// Every derivation allocates one node pointing at its parent, so sibling
/// chains share their common prefix without ever seeing each other's
/// suffixes. Cloning a chain is a reference-count bump.
#[derive(Debug, Clone, Default)]
pub struct ContextChain {
    tail: Option<Arc<Node>>,
}

impl ContextChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tail.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    /// Chain with `attrs` appended as one batch. An empty batch returns an
    /// identical chain.
    #[must_use]
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> ContextChain {
        if attrs.is_empty() {
            return self.clone();
        }
        self.push(GroupOrAttrs::Attrs(attrs))
    }

    /// Chain with a group marker appended. An empty name returns an
    /// identical chain.
    #[must_use]
    pub fn with_group(&self, name: impl Into<String>) -> ContextChain {
        let name = name.into();
        if name.is_empty() {
            return self.clone();
        }
        self.push(GroupOrAttrs::Group(name))
    }

    fn push(&self, item: GroupOrAttrs) -> ContextChain {
        let node = Node {
            item,
            len: self.len() + 1,
            parent: self.tail.clone(),
        };
        ContextChain {
            tail: Some(Arc::new(node)),
        }
    }

    /// The chain minus any group markers at its tail.
    ///
    /// Used for records that carry no attributes of their own, so groups
    /// opened with nothing inside them are not rendered. `self` is left
    /// untouched.
    #[must_use]
    pub fn without_trailing_groups(&self) -> ContextChain {
        let mut tail = self.tail.as_ref();
        while let Some(node) = tail {
            if !node.item.is_group() {
                break;
            }
            tail = node.parent.as_ref();
        }
        ContextChain { tail: tail.cloned() }
    }

    /// Elements from the oldest derivation to the newest.
    pub fn iter(&self) -> std::vec::IntoIter<&GroupOrAttrs> {
        let mut items = Vec::with_capacity(self.len());
        let mut tail = self.tail.as_deref();
        while let Some(node) = tail {
            items.push(&node.item);
            tail = node.parent.as_deref();
        }
        items.reverse();
        items.into_iter()
    }

    /// True when both chains are the same snapshot.
    pub fn ptr_eq(&self, other: &ContextChain) -> bool {
        match (&self.tail, &other.tail) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<'a> IntoIterator for &'a ContextChain {
    type Item = &'a GroupOrAttrs;
    type IntoIter = std::vec::IntoIter<&'a GroupOrAttrs>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(chain: &ContextChain) -> Vec<String> {
        chain
            .iter()
            .map(|item| match item {
                GroupOrAttrs::Group(name) => format!("group:{}", name),
                GroupOrAttrs::Attrs(attrs) => {
                    let keys: Vec<_> = attrs.iter().map(|a| a.key.as_str()).collect();
                    format!("attrs:{}", keys.join(","))
                }
            })
            .collect()
    }

    #[test]
    fn each_derivation_appends_one_element() {
        let root = ContextChain::new();
        let a = root.with_group("http");
        let b = a.with_attrs(vec![Attr::new("method", "GET"), Attr::new("path", "/")]);

        assert_eq!(root.len(), 0);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        assert_eq!(describe(&b), ["group:http", "attrs:method,path"]);
    }

    #[test]
    fn empty_derivations_return_the_same_snapshot() {
        let chain = ContextChain::new().with_group("svc");
        assert!(chain.with_attrs(Vec::new()).ptr_eq(&chain));
        assert!(chain.with_group("").ptr_eq(&chain));
    }

    #[test]
    fn siblings_share_prefix_without_seeing_each_other() {
        let parent = ContextChain::new().with_attrs(vec![Attr::new("app", "api")]);
        let left = parent.with_group("left");
        let right = parent.with_attrs(vec![Attr::new("right", true)]);

        assert_eq!(describe(&parent), ["attrs:app"]);
        assert_eq!(describe(&left), ["attrs:app", "group:left"]);
        assert_eq!(describe(&right), ["attrs:app", "attrs:right"]);
    }

    #[test]
    fn trailing_groups_are_trimmed_up_to_last_batch() {
        let chain = ContextChain::new()
            .with_group("a")
            .with_attrs(vec![Attr::new("k", 1)])
            .with_group("b")
            .with_group("c");

        let trimmed = chain.without_trailing_groups();
        assert_eq!(describe(&trimmed), ["group:a", "attrs:k"]);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(chain.len(), 4, "trimming must not alter the source chain");
    }

    #[test]
    fn trimming_only_groups_yields_empty_chain() {
        let chain = ContextChain::new().with_group("a").with_group("b");
        assert!(chain.without_trailing_groups().is_empty());
    }

    #[test]
    fn dropping_a_long_chain_does_not_recurse() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let mut chain = ContextChain::new();
                for i in 0..100_000 {
                    chain = chain.with_attrs(vec![Attr::new("i", i)]);
                }
                let shared = chain.with_group("tail");
                assert_eq!(shared.len(), 100_001);
                drop(chain);
                drop(shared);
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn dropping_a_branch_keeps_shared_prefix() {
        let parent = ContextChain::new().with_group("a").with_attrs(vec![Attr::new("k", 1)]);
        let child = parent.with_group("b").with_group("c");
        drop(child);
        assert_eq!(describe(&parent), ["group:a", "attrs:k"]);
    }

    #[test]
    fn trimming_keeps_chain_ending_in_attrs() {
        let chain = ContextChain::new().with_group("user").with_attrs(vec![Attr::new("id", "bob")]);
        assert!(chain.without_trailing_groups().ptr_eq(&chain));
    }
}
