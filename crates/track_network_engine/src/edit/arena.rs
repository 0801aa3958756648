//! Arena mit generationsgeprüften Handles.
//!
//! Einträge werden nur angehängt. Entfernte Einträge bleiben als Grabstein
//! stehen und erhöhen ihre Generation, sodass alte Handles ungültig werden.
//! Jede Arena trägt eine eigene Herkunfts-Kennung; Handles einer anderen
//! Arena (etwa einer bereits übernommenen Unit of Work) lösen nie auf.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_ORIGIN: AtomicU32 = AtomicU32::new(1);

/// Handle auf einen Arena-Eintrag.
pub struct Handle<T> {
    origin: u32,
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(origin: u32, index: u32, generation: u32) -> Self {
        Self {
            origin,
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Position in der Arena (Einfüge-Reihenfolge).
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
            && self.index == other.index
            && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.origin, self.index, self.generation).cmp(&(
            other.origin,
            other.index,
            other.generation,
        ))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}/{}", self.index, self.generation, self.origin)
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Append-only Arena.
///
/// Ein Klon behält die Herkunft, Handles bleiben für ihn gültig.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    origin: u32,
    entries: Vec<Entry<T>>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            origin: NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hängt einen Wert an und gibt sein Handle zurück.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let index = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        assert!(index < u32::MAX, "Arena voll");
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        self.live += 1;
        Handle::new(self.origin, index, 0)
    }

    /// Entfernt einen Wert; das Handle wird dabei ungültig.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        if handle.origin != self.origin {
            return None;
        }
        let entry = self.entries.get_mut(handle.index())?;
        if entry.generation != handle.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation += 1;
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if handle.origin != self.origin {
            return None;
        }
        self.entries
            .get(handle.index())
            .filter(|e| e.generation == handle.generation)
            .and_then(|e| e.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if handle.origin != self.origin {
            return None;
        }
        self.entries
            .get_mut(handle.index())
            .filter(|e| e.generation == handle.generation)
            .and_then(|e| e.value.as_mut())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Anzahl lebender Einträge.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Anzahl jemals vergebener Slots (Wasserstand für Rollbacks).
    pub fn watermark(&self) -> usize {
        self.entries.len()
    }

    /// Entfernt alle Einträge, die nach `watermark` angelegt wurden.
    pub fn discard_after(&mut self, watermark: usize) {
        for entry in self.entries.iter_mut().skip(watermark) {
            if entry.value.take().is_some() {
                entry.generation += 1;
                self.live -= 1;
            }
        }
    }

    /// Lebende Einträge in Einfüge-Reihenfolge.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        let origin = self.origin;
        self.entries.iter().enumerate().filter_map(move |(i, e)| {
            e.value
                .as_ref()
                .map(|v| (Handle::new(origin, i as u32, e.generation), v))
        })
    }

    /// Handles aller lebenden Einträge.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Handles der Einträge ab `watermark`.
    pub fn handles_after(&self, watermark: usize) -> Vec<Handle<T>> {
        self.iter()
            .filter(|(h, _)| h.index() >= watermark)
            .map(|(h, _)| h)
            .collect()
    }
}

impl<T> std::ops::Index<Handle<T>> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("veraltetes Handle {handle:?}"),
        }
    }
}

impl<T> std::ops::IndexMut<Handle<T>> for Arena<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("veraltetes Handle {handle:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handle_becomes_stale() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.remove(a), Some("a"));
        assert!(arena.get(a).is_none());
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 1);
        // Kein Slot-Recycling: neuer Eintrag bekommt einen neuen Index
        let c = arena.insert("c");
        assert_eq!(c.index(), 2);
    }

    #[test]
    #[should_panic(expected = "veraltetes Handle")]
    fn indexing_with_stale_handle_panics() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let _ = arena[a];
    }

    #[test]
    fn discard_after_watermark_drops_only_newer_entries() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let mark = arena.watermark();
        let b = arena.insert(2);
        let c = arena.insert(3);
        assert_eq!(arena.handles_after(mark), vec![b, c]);
        arena.discard_after(mark);
        assert!(arena.contains(a));
        assert!(!arena.contains(b));
        assert!(!arena.contains(c));
        assert_eq!(arena.iter().count(), 1);
    }

    #[test]
    fn handle_of_other_arena_never_resolves() {
        let mut first = Arena::new();
        let old = first.insert("alt");
        let mut second = Arena::new();
        let fresh = second.insert("neu");

        // Gleicher Index, gleiche Generation, andere Arena
        assert_eq!(old.index(), fresh.index());
        assert_ne!(old, fresh);
        assert!(second.get(old).is_none());
        assert!(second.get_mut(old).is_none());
        assert_eq!(second.remove(old), None);
        assert_eq!(second[fresh], "neu");

        // Ein Klon teilt die Herkunft
        let copy = first.clone();
        assert_eq!(copy[old], "alt");
    }
}
