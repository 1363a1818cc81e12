/// Hash of a name: djb2 (`h = h * 33 + byte`, seeded with 5381).
pub fn hash_name(name: &str) -> u64 {
    name.bytes()
        .fold(5381u64, |h, b| h.wrapping_mul(33).wrapping_add(u64::from(b)))
}

const INITIAL_CAPACITY: usize = 16;

/// A separately-chained hash table keyed by names borrowed from the program
/// text. Keys compare by content. Capacity doubles whenever the number of
/// entries exceeds three quarters of the bin count.
#[derive(Debug, Clone)]
pub struct SymbolTable<'src, V> {
    bins: Vec<Vec<(&'src str, V)>>,
    len: usize,
}

impl<V> Default for SymbolTable<'_, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'src, V> SymbolTable<'src, V> {
    pub fn new() -> Self {
        Self {
            bins: empty_bins(INITIAL_CAPACITY),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bins.
    pub fn capacity(&self) -> usize {
        self.bins.len()
    }

    fn bin_index(&self, name: &str) -> usize {
        (hash_name(name) % self.bins.len() as u64) as usize
    }

    /// Insert or overwrite.
    pub fn insert(&mut self, name: &'src str, value: V) {
        let index = self.bin_index(name);
        let bin = &mut self.bins[index];
        if let Some(entry) = bin.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
            return;
        }
        bin.push((name, value));
        self.len += 1;

        if self.len * 4 > self.bins.len() * 3 {
            self.grow();
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.bins[self.bin_index(name)]
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'src str, &V)> + '_ {
        self.bins
            .iter()
            .flat_map(|bin| bin.iter().map(|(key, value)| (*key, value)))
    }

    fn grow(&mut self) {
        let capacity = self.bins.len() * 2;
        let old = std::mem::replace(&mut self.bins, empty_bins(capacity));
        for (key, value) in old.into_iter().flatten() {
            let index = self.bin_index(key);
            self.bins[index].push((key, value));
        }
        tracing::trace!(capacity, len = self.len, "symbol table grew");
    }
}

impl<V: Copy + Default> SymbolTable<'_, V> {
    /// Lookup that treats a missing name as the default value.
    pub fn get_or_default(&self, name: &str) -> V {
        self.get(name).copied().unwrap_or_default()
    }
}

fn empty_bins<K, V>(capacity: usize) -> Vec<Vec<(K, V)>> {
    std::iter::repeat_with(Vec::new).take(capacity).collect()
}
