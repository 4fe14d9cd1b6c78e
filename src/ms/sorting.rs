// Reordering in place from: https://github.com/mbhall88/psdm/blob/0c8c4be5e4a6d566193b688824197fac2d233108/src/lib.rs#L13-L41
// MIT licensed
pub trait SortExt<T> {
    fn argsort_by<F>(
        &self,
        compare: F,
    ) -> Vec<usize>
    where
        F: Fn(&T, &T) -> std::cmp::Ordering;
    fn sort_by_indices(
        &mut self,
        indices: &mut [usize],
    );
}

impl<T> SortExt<T> for Vec<T> {
    fn argsort_by<F>(
        &self,
        compare: F,
    ) -> Vec<usize>
    where
        F: Fn(&T, &T) -> std::cmp::Ordering,
    {
        let mut indices = (0..self.len()).collect::<Vec<_>>();
        indices.sort_by(|&a, &b| compare(&self[a], &self[b]));
        indices
    }

    fn sort_by_indices(
        &mut self,
        indices: &mut [usize],
    ) {
        for idx in 0..self.len() {
            if indices[idx] != usize::MAX {
                let mut current_idx = idx;
                loop {
                    let target_idx = indices[current_idx];
                    indices[current_idx] = usize::MAX;
                    if indices[target_idx] == usize::MAX {
                        break;
                    }
                    self.swap(current_idx, target_idx);
                    current_idx = target_idx;
                }
            }
        }
    }
}

/// Sorts two parallel columns by the values of the first one.
pub fn sort_by_mz(
    mzs: &mut Vec<f64>,
    intensities: &mut Vec<f64>,
) {
    debug_assert_eq!(mzs.len(), intensities.len());
    let mut inds = mzs.argsort_by(|a, b| a.total_cmp(b));
    mzs.sort_by_indices(&mut inds.clone());
    intensities.sort_by_indices(&mut inds);
}
