// Copyright 2017 Matthew Plant. This file is part of DGF.
//
// DGF is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// DGF is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with DGF. If not, see <http://www.gnu.org/licenses/>.

use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

use rayon::prelude::*;

/// A strongly typed index into a Pool.
///
/// Nodes, particles and contacts each get their own id type so that a
/// ContactId can never be used to look up a node.
pub trait PoolId: Copy {
    fn from_index(i: usize) -> Self;
    fn index(self) -> usize;
}

impl PoolId for usize {
    #[inline(always)]
    fn from_index(i: usize) -> Self {
        i
    }

    #[inline(always)]
    fn index(self) -> usize {
        self
    }
}

/// Declares a newtype id usable as a Pool index.
#[macro_export]
macro_rules! pool_id {
    (
        $(#[$attr:meta])* $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
                 serde::Serialize, serde::Deserialize)]
        pub struct $name(pub usize);

        impl $crate::pool::PoolId for $name {
            #[inline(always)]
            fn from_index(i: usize) -> Self {
                $name(i)
            }

            #[inline(always)]
            fn index(self) -> usize {
                self.0
            }
        }
    };
}

/// Internal storage type used by Pool.
#[derive(Clone)]
enum PoolEntry<T> {
    FreeListEnd,
    FreeListPtr {
        next_free: usize,
    },
    Occupied(T)
}

impl<T> PoolEntry<T> {
    #[inline(always)]
    fn get(&self) -> Option<&T> {
        if let PoolEntry::Occupied(ref item) = *self {
            Some(item)
        } else {
            None
        }
    }

    #[inline(always)]
    fn get_mut(&mut self) -> Option<&mut T> {
        if let PoolEntry::Occupied(ref mut item) = *self {
            Some(item)
        } else {
            None
        }
    }
}

/// Growable arena that allows items to be removed and inserted without
/// changing the ids of other entries.
///
/// Removed slots are threaded onto a free list and handed out again by later
/// pushes, so an id is only stable while its item is alive.
#[derive(Clone)]
pub struct Pool<T, I: PoolId = usize> {
    len: usize,
    free_list: Option<usize>,
    entries: Vec<PoolEntry<T>>,
    id: PhantomData<I>,
}

impl<T, I: PoolId> Default for Pool<T, I> {
    fn default() -> Self {
        Pool::new()
    }
}

impl<T, I: PoolId> Pool<T, I> {
    /// Create an empty Pool.
    pub fn new() -> Self {
        Pool {
            len: 0,
            free_list: None,
            entries: Vec::new(),
            id: PhantomData,
        }
    }

    /// Create an empty Pool large enough to fit cap items.
    pub fn with_capacity(cap: usize) -> Self {
        Pool {
            len: 0,
            free_list: None,
            entries: Vec::with_capacity(cap),
            id: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the id the next push will use.
    pub fn next_id(&self) -> I {
        I::from_index(self.free_list.unwrap_or(self.entries.len()))
    }

    /// Push a new item to the Pool. Attempts to use spots left empty from
    /// removed items before performing a heap allocation.
    pub fn push(&mut self, item: T) -> I {
        self.len += 1;
        if let Some(free_item) = self.free_list {
            self.free_list = match self.entries[free_item] {
                PoolEntry::FreeListEnd => None,
                PoolEntry::FreeListPtr{ next_free } => Some(next_free),
                PoolEntry::Occupied(_) => unreachable!(),
            };
            self.entries[free_item] = PoolEntry::Occupied(item);
            I::from_index(free_item)
        } else {
            let i = self.entries.len();
            self.entries.push(PoolEntry::Occupied(item));
            I::from_index(i)
        }
    }

    /// Removes the item at id and adds its slot to the free list. Returns
    /// None if the slot was already empty.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let i = id.index();
        match self.entries.get(i) {
            Some(PoolEntry::Occupied(_)) => (),
            _ => return None,
        }
        let new_entry = match self.free_list {
            Some(next_free) => PoolEntry::FreeListPtr{ next_free },
            None => PoolEntry::FreeListEnd,
        };
        self.free_list = Some(i);
        self.len -= 1;
        match mem::replace(&mut self.entries[i], new_entry) {
            PoolEntry::Occupied(item) => Some(item),
            _ => unreachable!(),
        }
    }

    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.entries.get(id.index()).and_then(PoolEntry::get)
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.entries.get_mut(id.index()).and_then(PoolEntry::get_mut)
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T> + 'a {
        self.entries.iter().filter_map(PoolEntry::get)
    }

    pub fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = &'a mut T> + 'a {
        self.entries.iter_mut().filter_map(PoolEntry::get_mut)
    }

    /// Iterate over occupied entries together with their ids.
    pub fn iter_with_ids<'a>(&'a self) -> impl Iterator<Item = (I, &'a T)> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.get().map(|item| (I::from_index(i), item)))
    }
}

impl<T: Sync, I: PoolId + Send + Sync> Pool<T, I> {
    /// Parallel iteration over occupied entries.
    pub fn par_iter<'a>(&'a self) -> impl ParallelIterator<Item = &'a T> + 'a {
        self.entries.par_iter().filter_map(PoolEntry::get)
    }

    pub fn par_iter_with_ids<'a>(&'a self) -> impl ParallelIterator<Item = (I, &'a T)> + 'a {
        self.entries
            .par_iter()
            .enumerate()
            .filter_map(|(i, e)| e.get().map(|item| (I::from_index(i), item)))
    }
}

impl<T: Send, I: PoolId + Send + Sync> Pool<T, I> {
    /// Parallel mutable iteration. Every entry is handed to exactly one worker.
    pub fn par_iter_mut<'a>(&'a mut self) -> impl ParallelIterator<Item = &'a mut T> + 'a {
        self.entries.par_iter_mut().filter_map(PoolEntry::get_mut)
    }
}

impl<T, I: PoolId> Index<I> for Pool<T, I> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(item) => item,
            None => panic!("index {} is not occupied", id.index()),
        }
    }
}

impl<T, I: PoolId> IndexMut<I> for Pool<T, I> {
    fn index_mut(&mut self, id: I) -> &mut T {
        let i = id.index();
        match self.get_mut(id) {
            Some(item) => item,
            None => panic!("index {} is not occupied", i),
        }
    }
}
