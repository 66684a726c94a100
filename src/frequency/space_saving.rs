//! Space-Saving Sketch for Heavy Hitters Detection
//!
//! The Space-Saving algorithm (Metwally et al., 2005) is a deterministic streaming algorithm
//! for finding the most frequent items (heavy hitters) in a data stream. It provides:
//! - Guaranteed no false negatives: All items with frequency > epsilon*N will be detected
//! - Bounded error: Each count estimate has an associated error bound
//! - Space efficient: Uses O(1/epsilon) counters
//!
//! # Algorithm
//!
//! The algorithm maintains at most k = ceil(1/epsilon) item-count pairs. When a new item arrives:
//! 1. If the item is already tracked, increment its count
//! 2. If there's room for a new item, add it with count 1
//! 3. Otherwise, replace the item with minimum count:
//!    - Set the new item's count to min_count + 1
//!    - Set the error to min_count (the count of the replaced item)
//!
//! The error represents the maximum overestimation: true_count in [count - error, count]
//!
//! # Key Properties
//!
//! - **No false negatives**: Any item with true frequency > N/k will be in the sketch
//! - **Bounded error**: For any tracked item, error <= N/k where N is stream length
//! - **Deterministic**: Unlike Count-Min Sketch, Space-Saving is deterministic
//!
//! # References
//!
//! - Metwally, A., Agrawal, D., & El Abbadi, A. (2005). "Efficient computation of
//!   frequent and top-k elements in data streams"
//! - Cormode, G., & Hadjieleftheriou, M. (2008). "Finding frequent items in data streams"
//!
//! # Examples
//!
//! ```
//! use sketch_oxide::frequency::SpaceSaving;
//!
//! // Create a sketch that guarantees detection of items with > 10% frequency
//! let mut sketch = SpaceSaving::new(0.1).unwrap();
//!
//! // Add items
//! for _ in 0..100 {
//!     sketch.update("frequent".to_string());
//! }
//! for _ in 0..5 {
//!     sketch.update("rare".to_string());
//! }
//!
//! // Query estimates - returns (lower_bound, upper_bound)
//! if let Some((lower, upper)) = sketch.estimate(&"frequent".to_string()) {
//!     assert!(lower <= 100 && upper >= 100);
//! }
//!
//! // Get heavy hitters (items appearing more than threshold fraction)
//! let heavy = sketch.heavy_hitters(0.05);
//! assert!(!heavy.is_empty());
//! ```

use crate::common::{Mergeable, Sketch, SketchError};
use std::collections::HashMap;
use std::hash::Hash;

/// Space-Saving Sketch for finding heavy hitters in a data stream
///
/// This sketch tracks the most frequent items while providing error bounds
/// for each estimate. It guarantees that any item with true frequency greater
/// than epsilon * stream_length will be tracked.
///
/// # Type Parameters
///
/// - `T`: The item type, must implement `Hash`, `Eq`, and `Clone`
///
/// # Space Complexity
///
/// O(1/epsilon) - stores at most ceil(1/epsilon) items
///
/// # Time Complexity
///
/// - Update: O(k) worst case to find minimum (can be optimized with heap)
/// - Query: O(1) for hash lookup
/// - Heavy hitters: O(k log k) for sorting
#[derive(Debug, Clone)]
pub struct SpaceSaving<T: Hash + Eq + Clone> {
    /// Maximum number of items to track: k = ceil(1/epsilon)
    capacity: usize,
    /// Map of items to (count, error) pairs
    /// - count: estimated frequency (may overestimate)
    /// - error: maximum overestimation amount
    items: HashMap<T, (u64, u64)>,
    /// Total number of items seen in the stream
    stream_length: u64,
    /// Epsilon parameter for error bound
    epsilon: f64,
}

impl<T: Hash + Eq + Clone> SpaceSaving<T> {
    /// Creates a new Space-Saving sketch with the specified error bound
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Error bound in (0, 1). Items with frequency > epsilon*N are guaranteed
    ///   to be tracked. Smaller epsilon means more accuracy but more space.
    ///
    /// # Returns
    ///
    /// A new `SpaceSaving` sketch or an error if parameters are invalid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if epsilon is not in (0, 1).
    ///
    /// # Space
    ///
    /// The sketch uses ceil(1/epsilon) counters. For example:
    /// - epsilon = 0.1 -> 10 counters
    /// - epsilon = 0.01 -> 100 counters
    /// - epsilon = 0.001 -> 1000 counters
    ///
    /// # Examples
    ///
    /// ```
    /// use sketch_oxide::frequency::SpaceSaving;
    ///
    /// // Track items with > 1% frequency
    /// let sketch: SpaceSaving<String> = SpaceSaving::new(0.01).unwrap();
    /// ```
    pub fn new(epsilon: f64) -> Result<Self, SketchError> {
        if epsilon <= 0.0 || epsilon >= 1.0 {
            return Err(SketchError::InvalidParameter {
                param: "epsilon".to_string(),
                value: epsilon.to_string(),
                constraint: "must be in (0, 1)".to_string(),
            });
        }

        let capacity = (1.0 / epsilon).ceil() as usize;
        // Ensure minimum capacity of 2
        let capacity = capacity.max(2);

        Ok(Self {
            capacity,
            items: HashMap::with_capacity(capacity),
            stream_length: 0,
            epsilon,
        })
    }

    /// Creates a new Space-Saving sketch with explicit capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of items to track (must be >= 2)
    ///
    /// # Returns
    ///
    /// A new `SpaceSaving` sketch or an error if parameters are invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use sketch_oxide::frequency::SpaceSaving;
    ///
    /// let sketch: SpaceSaving<u64> = SpaceSaving::with_capacity(100).unwrap();
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self, SketchError> {
        if capacity < 2 {
            return Err(SketchError::InvalidParameter {
                param: "capacity".to_string(),
                value: capacity.to_string(),
                constraint: "must be >= 2".to_string(),
            });
        }

        let epsilon = 1.0 / capacity as f64;

        Ok(Self {
            capacity,
            items: HashMap::with_capacity(capacity),
            stream_length: 0,
            epsilon,
        })
    }

    /// Updates the sketch with a single occurrence of an item
    ///
    /// # Arguments
    ///
    /// * `item` - The item to add to the stream
    ///
    /// # Algorithm
    ///
    /// 1. If item is already tracked: increment its count
    /// 2. Else if capacity not reached: add item with count=1, error=0
    /// 3. Else: replace minimum-count item with new item, setting error=min_count
    ///
    /// # Examples
    ///
    /// ```
    /// use sketch_oxide::frequency::SpaceSaving;
    ///
    /// let mut sketch = SpaceSaving::new(0.1).unwrap();
    /// sketch.update("hello".to_string());
    /// sketch.update("world".to_string());
    /// sketch.update("hello".to_string());
    /// ```
    #[inline]
    pub fn update(&mut self, item: T) {
        self.stream_length += 1;

        // Case 1: Item already tracked - increment count
        if let Some((count, _error)) = self.items.get_mut(&item) {
            *count += 1;
            return;
        }

        // Case 2: Space available - add new item with count=1, error=0
        if self.items.len() < self.capacity {
            self.items.insert(item, (1, 0));
            return;
        }

        // Case 3: At capacity - replace minimum count item
        // Find item with minimum count
        let min_count = self
            .items
            .values()
            .map(|(count, _)| *count)
            .min()
            .unwrap_or(0);

        // Find and remove an item with minimum count
        let min_item = self
            .items
            .iter()
            .find(|(_, (count, _))| *count == min_count)
            .map(|(k, _)| k.clone());

        if let Some(old_item) = min_item {
            self.items.remove(&old_item);
            // Insert new item with count = min_count + 1, error = min_count
            self.items.insert(item, (min_count + 1, min_count));
        }
    }

    /// Estimates the frequency of an item
    ///
    /// # Arguments
    ///
    /// * `item` - The item to query
    ///
    /// # Returns
    ///
    /// - `Some((lower_bound, upper_bound))` if the item is tracked
    /// - `None` if the item is not currently tracked
    ///
    /// The true frequency is guaranteed to be in [lower_bound, upper_bound]:
    /// - lower_bound = count - error (never negative)
    /// - upper_bound = count
    ///
    /// If an item is not tracked, its true frequency is at most N/k where
    /// N is stream_length and k is capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use sketch_oxide::frequency::SpaceSaving;
    ///
    /// let mut sketch = SpaceSaving::new(0.1).unwrap();
    /// for _ in 0..42 {
    ///     sketch.update("test".to_string());
    /// }
    ///
    /// if let Some((lower, upper)) = sketch.estimate(&"test".to_string()) {
    ///     assert!(lower <= 42 && upper >= 42);
    /// }
    /// ```
    #[inline]
    pub fn estimate(&self, item: &T) -> Option<(u64, u64)> {
        self.items.get(item).map(|&(count, error)| {
            let lower = count.saturating_sub(error);
            let upper = count;
            (lower, upper)
        })
    }

    /// Returns all items that may be heavy hitters
    ///
    /// A heavy hitter is an item whose true frequency exceeds `threshold * stream_length`.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Frequency threshold in (0, 1)
    ///
    /// # Returns
    ///
    /// A vector of tuples: (item, lower_bound, upper_bound)
    /// - Sorted by upper bound (estimated count) in descending order
    /// - All items whose upper bound exceeds the threshold are included
    ///
    /// # Guarantees
    ///
    /// - **No false negatives**: Any item with true frequency > threshold*N will be included
    ///   (if threshold >= epsilon)
    /// - **Possible false positives**: Some returned items may have true frequency below threshold
    ///
    /// # Examples
    ///
    /// ```
    /// use sketch_oxide::frequency::SpaceSaving;
    ///
    /// let mut sketch = SpaceSaving::new(0.01).unwrap();
    ///
    /// // Add items with different frequencies
    /// for _ in 0..100 { sketch.update("common".to_string()); }
    /// for _ in 0..10 { sketch.update("rare".to_string()); }
    ///
    /// // Get items appearing more than 5% of the time
    /// let heavy = sketch.heavy_hitters(0.05);
    /// ```
    pub fn heavy_hitters(&self, threshold: f64) -> Vec<(T, u64, u64)> {
        let min_count = (threshold * self.stream_length as f64).ceil() as u64;

        let mut result: Vec<_> = self
            .items
            .iter()
            .filter_map(|(item, &(count, error))| {
                // Include if upper bound (count) exceeds threshold
                // This ensures no false negatives
                if count >= min_count {
                    let lower = count.saturating_sub(error);
                    Some((item.clone(), lower, count))
                } else {
                    None
                }
            })
            .collect();

        // Sort by upper bound (count) descending
        result.sort_by(|a, b| b.2.cmp(&a.2));
        result
    }

    /// Returns the top-k most frequent items
    ///
    /// # Arguments
    ///
    /// * `k` - Number of items to return
    ///
    /// # Returns
    ///
    /// A vector of at most k tuples: (item, lower_bound, upper_bound)
    /// sorted by upper bound descending.
    ///
    /// # Examples
    ///
    /// ```
    /// use sketch_oxide::frequency::SpaceSaving;
    ///
    /// let mut sketch = SpaceSaving::new(0.01).unwrap();
    /// for i in 0..100u64 {
    ///     for _ in 0..i { sketch.update(i); }
    /// }
    ///
    /// let top10 = sketch.top_k(10);
    /// assert!(top10.len() <= 10);
    /// ```
    pub fn top_k(&self, k: usize) -> Vec<(T, u64, u64)> {
        let mut result: Vec<_> = self
            .items
            .iter()
            .map(|(item, &(count, error))| {
                let lower = count.saturating_sub(error);
                (item.clone(), lower, count)
            })
            .collect();

        // Sort by upper bound (count) descending
        result.sort_by(|a, b| b.2.cmp(&a.2));
        result.truncate(k);
        result
    }

    /// Returns the capacity (maximum number of items tracked)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the total number of items seen in the stream
    #[inline]
    pub fn stream_length(&self) -> u64 {
        self.stream_length
    }

    /// Returns the epsilon parameter
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns the number of items currently tracked
    #[inline]
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the sketch is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the maximum possible error for any item
    ///
    /// For tracked items, their individual error may be lower.
    /// For untracked items, their true count is at most this value.
    #[inline]
    pub fn max_error(&self) -> u64 {
        (self.stream_length as f64 * self.epsilon).ceil() as u64
    }
}

impl<T: Hash + Eq + Clone> SpaceSaving<T> {
    /// Merges another Space-Saving sketch into this one
    ///
    /// The merge operation combines two sketches while maintaining error bounds.
    /// After merging, error bounds are conservatively adjusted.
    ///
    /// # Arguments
    ///
    /// * `other` - The sketch to merge
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleSketches` if the sketches have different capacities.
    ///
    /// # Algorithm
    ///
    /// 1. Add counts for items in both sketches
    /// 2. For items only in one sketch, add the other's max_error to their error
    /// 3. Reduce to capacity by removing items with smallest counts
    ///
    /// # Examples
    ///
    /// ```
    /// use sketch_oxide::frequency::SpaceSaving;
    ///
    /// let mut sketch1: SpaceSaving<String> = SpaceSaving::new(0.1).unwrap();
    /// let mut sketch2: SpaceSaving<String> = SpaceSaving::new(0.1).unwrap();
    ///
    /// sketch1.update("a".to_string());
    /// sketch2.update("b".to_string());
    ///
    /// sketch1.merge(&sketch2).unwrap();
    /// ```
    pub fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.capacity != other.capacity {
            return Err(SketchError::IncompatibleSketches {
                reason: format!(
                    "capacity mismatch: {} vs {} (different epsilon parameters)",
                    self.capacity, other.capacity
                ),
            });
        }

        // Calculate max errors for conservative bounds
        let other_max_error = other.max_error();
        let self_max_error = self.max_error();

        // Merge items from other into self
        for (item, &(other_count, other_error)) in &other.items {
            if let Some((count, error)) = self.items.get_mut(item) {
                // Item in both: sum counts, sum errors
                *count += other_count;
                *error += other_error;
            } else {
                // Item only in other: add self's max_error to account for possible missed counts
                let new_error = other_error + self_max_error;
                self.items.insert(item.clone(), (other_count, new_error));
            }
        }

        // For items only in self, add other's max_error
        for (item, (count, error)) in self.items.iter_mut() {
            if !other.items.contains_key(item) {
                *error += other_max_error;
                // Ensure error doesn't exceed count
                *error = (*error).min(*count);
            }
        }

        // Update stream length
        self.stream_length += other.stream_length;

        // Reduce to capacity if needed
        while self.items.len() > self.capacity {
            // Find and remove item with minimum count
            let min_item = self
                .items
                .iter()
                .min_by_key(|(_, (count, _))| *count)
                .map(|(k, _)| k.clone());

            if let Some(item) = min_item {
                self.items.remove(&item);
            } else {
                break;
            }
        }

        Ok(())
    }
}

// Implement the Sketch trait
impl<T: Hash + Eq + Clone + 'static> Sketch for SpaceSaving<T> {
    type Item = T;

    fn update(&mut self, item: &Self::Item) {
        SpaceSaving::update(self, item.clone());
    }

    fn estimate(&self) -> f64 {
        // Return the count of the most frequent item, or 0 if empty
        self.items
            .values()
            .map(|(count, _)| *count)
            .max()
            .unwrap_or(0) as f64
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn serialize(&self) -> Vec<u8> {
        // This is a simplified serialization that works for basic types
        // For complex types T, serde feature should be used
        let mut bytes = Vec::new();

        // Header: capacity (8 bytes) + stream_length (8 bytes) + epsilon (8 bytes) + num_items (8 bytes)
        bytes.extend_from_slice(&self.capacity.to_le_bytes());
        bytes.extend_from_slice(&self.stream_length.to_le_bytes());
        bytes.extend_from_slice(&self.epsilon.to_le_bytes());
        bytes.extend_from_slice(&self.items.len().to_le_bytes());

        // Note: Full item serialization requires T to implement serialization
        // This basic implementation only works when items HashMap is empty
        // For production use with arbitrary T, use serde feature

        bytes
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, SketchError> {
        if bytes.len() < 32 {
            return Err(SketchError::DeserializationError(
                "insufficient bytes for header".to_string(),
            ));
        }

        let mut offset = 0;

        let capacity = usize::from_le_bytes(
            bytes[offset..offset + 8]
                .try_into()
                .map_err(|_| SketchError::DeserializationError("invalid capacity".to_string()))?,
        );
        offset += 8;

        let stream_length =
            u64::from_le_bytes(bytes[offset..offset + 8].try_into().map_err(|_| {
                SketchError::DeserializationError("invalid stream_length".to_string())
            })?);
        offset += 8;

        let epsilon = f64::from_le_bytes(
            bytes[offset..offset + 8]
                .try_into()
                .map_err(|_| SketchError::DeserializationError("invalid epsilon".to_string()))?,
        );
        offset += 8;

        let num_items = usize::from_le_bytes(
            bytes[offset..offset + 8]
                .try_into()
                .map_err(|_| SketchError::DeserializationError("invalid num_items".to_string()))?,
        );

        if num_items > 0 {
            return Err(SketchError::DeserializationError(
                "generic deserialization of items not supported; use serde feature".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            items: HashMap::with_capacity(capacity),
            stream_length,
            epsilon,
        })
    }
}

// Implement the Mergeable trait
impl<T: Hash + Eq + Clone + 'static> Mergeable for SpaceSaving<T> {
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        SpaceSaving::merge(self, other)
    }
}
