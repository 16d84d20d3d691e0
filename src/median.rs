use std::cmp::Ordering;

use rand::Rng;

/// Index of the median of one to three elements under `cmp`.
fn small_median_by<T, F>(arr: &[T], cmp: &mut F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut le = |x: &T, y: &T| cmp(x, y) != Ordering::Greater;
    match arr.len() {
        1 => 0,
        2 => if le(&arr[0], &arr[1]) { 0 } else { 1 },
        3 => if le(&arr[1], &arr[2]) {
            if le(&arr[1], &arr[0]) {
                if le(&arr[0], &arr[2]) { 0 } else { 2 }
            } else {
                1
            }
        } else if le(&arr[2], &arr[0]) {
            if le(&arr[0], &arr[1]) { 0 } else { 1 }
        } else {
            2
        },
        n => panic!("small_median_by: expected 1 to 3 elements, got {}", n),
    }
}

/// Partially order `arr` so that `arr[k]` holds the element of rank `k`,
/// everything before it compares `<=` and everything after it `>=`.
///
/// The pivot at each round is the median of three elements drawn from
/// `rng`, so the resulting permutation is a deterministic function of the
/// input order and the generator state. Elements equal to the pivot are
/// gathered in the middle, which keeps inputs with few distinct values
/// (Hamming distances over a few words) linear.
///
/// Does nothing when `k` is out of bounds.
pub fn quick_select_by<T, R, F>(arr: &mut [T], k: usize, rng: &mut R, mut cmp: F)
where
    T: Clone,
    R: Rng + ?Sized,
    F: FnMut(&T, &T) -> Ordering,
{
    let mut lo = 0;
    let mut hi = arr.len();
    if k >= hi {
        return;
    }

    while hi - lo > 1 {
        let part = &mut arr[lo..hi];
        let n = part.len();
        if n == 2 {
            if cmp(&part[1], &part[0]) == Ordering::Less {
                part.swap(0, 1);
            }
            return;
        }

        // Median of three random elements as pivot.
        part.swap(0, rng.random_range(0..n));
        part.swap(1, rng.random_range(1..n));
        part.swap(2, rng.random_range(2..n));
        let mid = small_median_by(&part[0..3], &mut cmp);
        let pivot = part[mid].clone();

        // [0, lt) < pivot, [lt, gt) == pivot, [gt, n) > pivot
        let (mut lt, mut i, mut gt) = (0, 0, n);
        while i < gt {
            match cmp(&part[i], &pivot) {
                Ordering::Less => {
                    part.swap(lt, i);
                    lt += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    gt -= 1;
                    part.swap(i, gt);
                }
                Ordering::Equal => i += 1,
            }
        }

        let rank = k - lo;
        if rank < lt {
            hi = lo + lt;
        } else if rank >= gt {
            lo += gt;
        } else {
            return;
        }
    }
}
