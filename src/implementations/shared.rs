use std::sync::atomic::{AtomicU64, Ordering};

use crate::kernels::VectorView;

/*
  ワーカー間で共有する反復ベクトル x の公開用コピー

  各ワーカーは自分の担当区間だけを publish し、行列ベクトル積では全区間を読む。
  書き込み区間は重ならないので、要素ごとの Relaxed で十分。
  publish と読み取りの順序はバリア (Barrier / Rendezvous) が保証する。
*/
pub struct SharedVector {
    data: Vec<AtomicU64>,
}

impl SharedVector {
    pub fn zeros(n: usize) -> Self {
        SharedVector {
            data: (0..n).map(|_| AtomicU64::new(0.0f64.to_bits())).collect(),
        }
    }

    /// values を offset から書き込む
    pub fn publish(&self, offset: usize, values: &[f64]) {
        for (slot, v) in self.data[offset..offset + values.len()].iter().zip(values) {
            slot.store(v.to_bits(), Ordering::Relaxed);
        }
    }
}

impl VectorView for SharedVector {
    fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    fn get(&self, i: usize) -> f64 {
        f64::from_bits(self.data[i].load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(shared: &SharedVector) -> Vec<f64> {
        (0..shared.len()).map(|i| shared.get(i)).collect()
    }

    #[test]
    fn publish_only_touches_range() {
        let shared = SharedVector::zeros(5);
        shared.publish(1, &[1.5, -2.0]);
        assert_eq!(snapshot(&shared), vec![0.0, 1.5, -2.0, 0.0, 0.0]);
        assert_eq!(shared.len(), 5);
    }
}
