use std::ops::Range;

use crate::system::{LinearSystem, EXACT_SOLUTION};

/*
  区間単位のカーネル群

  各カーネルは担当区間のスライスにのみ書き込む。
  書き込み先が重ならないので、ワーカー間でロックなしに同時実行できる。
  （入力ベクトルを同時に書き換えないことが前提）
*/

/// 行列ベクトル積で読む側のベクトル。全要素を読むが書き込まない
pub trait VectorView {
    fn len(&self) -> usize;
    fn get(&self, i: usize) -> f64;
}

impl VectorView for [f64] {
    fn len(&self) -> usize {
        <[f64]>::len(self)
    }

    #[inline(always)]
    fn get(&self, i: usize) -> f64 {
        self[i]
    }
}

/// out[k] = Σ_j A[range.start + k][j] · x[j]
pub fn mat_vec_product<V: VectorView + ?Sized>(
    system: &LinearSystem,
    x: &V,
    out: &mut [f64],
    range: Range<usize>,
) {
    debug_assert_eq!(out.len(), range.len());
    debug_assert_eq!(x.len(), system.size());

    for (dst, i) in out.iter_mut().zip(range) {
        let mut acc = 0.0;
        for (j, a) in system.row(i).iter().enumerate() {
            acc += a * x.get(j);
        }
        *dst = acc;
    }
}

/// u[k] -= v[k]
pub fn subtract(u: &mut [f64], v: &[f64]) {
    debug_assert_eq!(u.len(), v.len());
    for (a, b) in u.iter_mut().zip(v) {
        *a -= b;
    }
}

/// u[k] *= s
pub fn scale(u: &mut [f64], s: f64) {
    for a in u.iter_mut() {
        *a *= s;
    }
}

/// Σ u[k]²  (平方根は呼び出し側で全区間を合算した後に取る)
pub fn l2_norm_partial(u: &[f64]) -> f64 {
    u.iter().map(|v| v * v).sum()
}

/// (Σ|x[k] - 1|, Σ|x[k] - 1| / 1)
pub fn error_sums_partial(x: &[f64]) -> (f64, f64) {
    x.iter().fold((0.0, 0.0), |(abs_sum, rel_sum), &v| {
        let absolute = (v - EXACT_SOLUTION).abs();
        let relative = ((v - EXACT_SOLUTION) / EXACT_SOLUTION).abs();
        (abs_sum + absolute, rel_sum + relative)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat_vec_on_sub_range() {
        let sys = LinearSystem::new(4);
        let x = [1.0, 2.0, 3.0, 4.0];
        let mut out = [0.0; 2];
        mat_vec_product(&sys, &x[..], &mut out, 1..3);
        // 行1: 1 + 4 + 3 + 4 = 12, 行2: 1 + 2 + 6 + 4 = 13
        assert_eq!(out, [12.0, 13.0]);
    }

    #[test]
    fn mat_vec_of_ones_is_rhs() {
        let sys = LinearSystem::new(6);
        let x = vec![1.0; 6];
        let mut out = vec![0.0; 6];
        mat_vec_product(&sys, x.as_slice(), &mut out, 0..6);
        assert_eq!(out.as_slice(), sys.rhs());
    }

    #[test]
    fn subtract_and_scale() {
        let mut u = [3.0, 5.0];
        subtract(&mut u, &[1.0, 1.0]);
        assert_eq!(u, [2.0, 4.0]);
        scale(&mut u, 0.5);
        assert_eq!(u, [1.0, 2.0]);
    }

    #[test]
    fn partial_norms_combine() {
        let v = [3.0, 4.0, 12.0];
        let total = l2_norm_partial(&v[..2]) + l2_norm_partial(&v[2..]);
        assert_eq!(total.sqrt(), 13.0);
    }

    #[test]
    fn error_sums() {
        let (abs_sum, rel_sum) = error_sums_partial(&[1.5, 0.5, 1.0]);
        assert_eq!(abs_sum, 1.0);
        assert_eq!(rel_sum, 1.0);
    }
}
