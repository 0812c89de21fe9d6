use crate::error::Result;
use rand::seq::SliceRandom;
use rand::Rng;

/// Trait describing a dataset that can be loaded entirely into memory.
pub trait Dataset {
    /// Type representing a single sample from the dataset.
    type Item: Clone;

    /// Load all samples for the dataset.
    fn load(&self) -> Result<Vec<Self::Item>>;
}

/// Generic data loader supporting batching, optional shuffling and
/// preprocessing through user provided transforms.
pub struct DataLoader<T: Clone> {
    data: Vec<T>,
    batch_size: usize,
    index: usize,
}

impl<T: Clone> DataLoader<T> {
    /// Wrap samples that are already in memory.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn new(data: Vec<T>, batch_size: usize) -> Self {
        Self {
            data,
            batch_size: batch_size.max(1),
            index: 0,
        }
    }

    /// Load `dataset` and apply `transform` to every sample.
    pub fn from_dataset<D>(
        dataset: &D,
        batch_size: usize,
        mut transform: Option<Box<dyn FnMut(&mut T)>>,
    ) -> Result<Self>
    where
        D: Dataset<Item = T>,
    {
        let mut data = dataset.load()?;
        if let Some(f) = transform.as_mut() {
            for sample in &mut data {
                f(sample);
            }
        }
        Ok(Self::new(data, batch_size))
    }

    /// Randomly permute the remaining samples.
    pub fn shuffled<R: Rng>(mut self, rng: &mut R) -> Self {
        self.data[self.index..].shuffle(rng);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of batches a full pass yields.
    pub fn num_batches(&self) -> usize {
        (self.data.len() + self.batch_size - 1) / self.batch_size
    }
}

impl<T: Clone> Iterator for DataLoader<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.data.len() {
            return None;
        }
        let end = (self.index + self.batch_size).min(self.data.len());
        let batch = self.data[self.index..end].to_vec();
        self.index = end;
        Some(batch)
    }
}
