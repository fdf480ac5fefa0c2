use super::geo::GeoPoint;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Default number of workers selected for a new task.
pub const DEFAULT_NEAREST_WORKERS: usize = 3;

/// Snapshot of a worker's position taken from the worker directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerLocation {
    pub worker_id: String,
    pub email: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedWorker {
    pub worker: WorkerLocation,
    pub distance_km: f64,
}

/// Bounded max-heap keeping the `capacity` smallest distances seen so far.
///
/// The root always holds the largest retained distance, so a new candidate only
/// has to beat the root to get in. Equal distances never evict an existing entry.
#[derive(Debug)]
pub struct NearestWorkersHeap {
    capacity: usize,
    heap: Vec<RankedWorker>,
}

impl NearestWorkersHeap {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Largest retained distance, i.e. the next eviction candidate.
    pub fn peek_farthest(&self) -> Option<&RankedWorker> {
        self.heap.first()
    }

    pub fn insert(&mut self, worker: WorkerLocation, distance_km: f64) {
        if self.capacity == 0 {
            return;
        }
        let entry = RankedWorker { worker, distance_km };

        if self.heap.len() < self.capacity {
            self.heap.push(entry);
            self.sift_up(self.heap.len() - 1);
        } else if distance_km < self.heap[0].distance_km {
            self.heap[0] = entry;
            self.sift_down(0);
        }
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[parent].distance_km < self.heap[index].distance_km {
                self.heap.swap(parent, index);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;

            if left < len && self.heap[left].distance_km > self.heap[largest].distance_km {
                largest = left;
            }
            if right < len && self.heap[right].distance_km > self.heap[largest].distance_km {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.heap.swap(index, largest);
            index = largest;
        }
    }

    /// Consume the heap and return the retained workers, nearest first.
    pub fn into_nearest(self) -> Vec<RankedWorker> {
        let mut nearest = self.heap;
        nearest.sort_by_key(|r| OrderedFloat(r.distance_km));
        nearest
    }
}

/// Return the `k` candidates closest to `origin`, nearest first.
pub fn select_nearest<'a, I>(origin: &GeoPoint, candidates: I, k: usize) -> Vec<RankedWorker>
where
    I: IntoIterator<Item = &'a WorkerLocation>,
{
    let mut heap = NearestWorkersHeap::new(k);
    for candidate in candidates {
        let distance = origin.distance_km(&candidate.location);
        heap.insert(candidate.clone(), distance);
    }
    heap.into_nearest()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(id: &str, lat: f64, lon: f64) -> WorkerLocation {
        WorkerLocation {
            worker_id: id.to_string(),
            email: format!("{}@example.com", id),
            location: GeoPoint::new(lat, lon),
        }
    }

    #[test]
    fn root_is_the_farthest_retained() {
        let mut heap = NearestWorkersHeap::new(3);
        heap.insert(worker("a", 0.0, 0.0), 5.0);
        heap.insert(worker("b", 0.0, 0.0), 9.0);
        heap.insert(worker("c", 0.0, 0.0), 1.0);
        assert_eq!(heap.peek_farthest().unwrap().distance_km, 9.0);

        heap.insert(worker("d", 0.0, 0.0), 2.0);
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek_farthest().unwrap().distance_km, 5.0);
    }

    #[test]
    fn equal_distance_does_not_evict() {
        let mut heap = NearestWorkersHeap::new(1);
        heap.insert(worker("first", 0.0, 0.0), 4.0);
        heap.insert(worker("second", 0.0, 0.0), 4.0);
        let kept = heap.into_nearest();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].worker.worker_id, "first");
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut heap = NearestWorkersHeap::new(0);
        heap.insert(worker("a", 0.0, 0.0), 1.0);
        assert!(heap.is_empty());
    }

    #[test]
    fn extraction_is_ascending() {
        let mut heap = NearestWorkersHeap::new(4);
        for (i, d) in [7.5, 0.5, 3.0, 12.0, 1.0, 9.0].iter().enumerate() {
            heap.insert(worker(&i.to_string(), 0.0, 0.0), *d);
        }
        let distances: Vec<f64> = heap.into_nearest().iter().map(|r| r.distance_km).collect();
        assert_eq!(distances, vec![0.5, 1.0, 3.0, 7.5]);
    }
}
