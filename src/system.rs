pub const DEFAULT_SIZE: usize = 1000;  // 行列サイズ n
pub const DEFAULT_THREADS: usize = 2;  // スレッド数 p
pub const DEFAULT_EPSILON: f64 = 1e-5;  // 収束判定の基準値 (‖b‖ 倍される)
pub const DEFAULT_STEP: f64 = 1.0 / 100000.0;  // 反復の刻み幅 τ
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000_000;  // 反復回数の上限

pub const DIAGONAL: f64 = 2.0;
pub const OFF_DIAGONAL: f64 = 1.0;
pub const EXACT_SOLUTION: f64 = 1.0;  // この系の厳密解は全要素1

/*
  固定の対角優位系  A·x = b
    A[i][j] = 2 (i == j), 1 (それ以外)
    b[i]    = n + 1
  厳密解は x = (1, 1, ..., 1)。

  行列は行優先の密な Vec<f64> として一度だけ構築し、以降は読み取り専用。
*/
#[derive(Clone, Debug)]
pub struct LinearSystem {
    n: usize,
    matrix: Vec<f64>,
    rhs: Vec<f64>,
}

impl LinearSystem {
    pub fn new(n: usize) -> Self {
        let mut matrix = vec![OFF_DIAGONAL; n * n];
        for i in 0..n {
            matrix[i * n + i] = DIAGONAL;
        }
        let rhs = vec![(n + 1) as f64; n];
        LinearSystem { n, matrix, rhs }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.matrix[i * self.n..(i + 1) * self.n]
    }

    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }
}

/// A, b, x, r を合わせた使用バイト数。usize に収まらなければ None
pub fn memory_bytes(n: usize) -> Option<usize> {
    n.checked_mul(n)?
        .checked_add(n.checked_mul(3)?)?
        .checked_mul(std::mem::size_of::<f64>())
}

/// A, b, x, r を合わせた使用メモリ (MiB)
pub fn memory_mib(n: usize) -> f64 {
    memory_bytes(n).map_or(f64::INFINITY, |bytes| bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_diagonally_dominant_pattern() {
        let sys = LinearSystem::new(5);
        for i in 0..5 {
            for j in 0..5 {
                let expected = if i == j { DIAGONAL } else { OFF_DIAGONAL };
                assert_eq!(sys.row(i)[j], expected);
            }
        }
        assert!(sys.rhs().iter().all(|&v| v == 6.0));
    }

    #[test]
    fn ones_vector_solves_system() {
        let n = 7;
        let sys = LinearSystem::new(n);
        for i in 0..n {
            let ax: f64 = sys.row(i).iter().map(|a| a * EXACT_SOLUTION).sum();
            assert_eq!(ax, sys.rhs()[i]);
        }
    }

    #[test]
    fn memory_estimate() {
        // 1024x1024 の行列だけで 8 MiB
        assert!(memory_mib(1024) > 8.0);
        assert!(memory_mib(1024) < 8.1);
    }

    #[test]
    fn memory_overflow_is_detected() {
        assert_eq!(memory_bytes(4), Some((16 + 12) * 8));
        assert_eq!(memory_bytes(1 << 33), None);
        assert!(memory_mib(1 << 33).is_infinite());
    }
}
