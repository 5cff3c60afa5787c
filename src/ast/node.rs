use std::ops::Deref;

use rand::Rng;

use crate::span::Source;

#[derive(Eq)]
pub struct Node<T> {
    pub id: u64,
    pub value: T,
    pub src: Source,
}

impl<T> Deref for Node<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> std::fmt::Display for Node<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> std::fmt::Debug for Node<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &format!("{:x}", self.id))
            .field("value", &self.value)
            .finish()
    }
}

impl<T> Clone for Node<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Node {
            id: self.id,
            value: self.value.clone(),
            src: self.src.clone(),
        }
    }
}

impl<T> PartialEq for Node<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.value == other.value
    }
}

impl<T> Node<T> {
    pub fn new(value: T) -> Node<T> {
        let mut rng = rand::thread_rng();
        let id = rng.gen::<u64>();
        Node {
            id,
            value,
            src: Source::default(),
        }
    }

    pub fn with_src(mut self, src: Source) -> Node<T> {
        self.src = src;
        self
    }

    pub fn unpack(self) -> (u64, T, Source) {
        (self.id, self.value, self.src)
    }

    /// Rebuild the node around a new value, keeping its identity and source.
    pub fn map<F: FnOnce(T) -> T>(self, f: F) -> Node<T> {
        Node {
            id: self.id,
            value: f(self.value),
            src: self.src,
        }
    }
}
