//! Node identifiers
//!
//! Nodes are addressed by generational indices so a stale id held after a
//! node was removed is detected instead of aliasing a newer node.

use std::fmt;

/// Identifier of a scene node
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Id that never refers to a node
    #[inline]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: u32::MAX,
        }
    }

    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NodeId(null)")
        } else {
            write!(f, "NodeId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

/// Hands out node ids, recycling freed slots with a bumped generation
#[derive(Debug, Default)]
pub struct NodeAllocator {
    generations: Vec<u32>,
    free_list: Vec<u32>,
    alive: usize,
}

impl NodeAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> NodeId {
        self.alive += 1;
        match self.free_list.pop() {
            Some(index) => NodeId::new(index, self.generations[index as usize]),
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                NodeId::new(index, 0)
            }
        }
    }

    /// Returns false if the id was already stale
    pub fn free(&mut self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = &mut self.generations[id.index as usize];
        *slot = slot.wrapping_add(1);
        self.free_list.push(id.index);
        self.alive -= 1;
        true
    }

    #[inline]
    pub fn is_alive(&self, id: NodeId) -> bool {
        !id.is_null()
            && self
                .generations
                .get(id.index as usize)
                .is_some_and(|&generation| generation == id.generation)
    }

    #[inline]
    pub fn alive_count(&self) -> usize {
        self.alive
    }
}
