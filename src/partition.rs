use std::ops::Range;

use crate::error::{Result, SolverError};

/// [0, n) を p 個の連続・非重複な区間に分割する。余りは最後の区間が吸収する
pub fn partition(n: usize, p: usize) -> Result<Vec<Range<usize>>> {
    if p == 0 {
        return Err(SolverError::configuration("スレッド数は1以上である必要があります"));
    }
    if p > n {
        return Err(SolverError::configuration(format!(
            "スレッド数 ({p}) が行列サイズ ({n}) を超えています"
        )));
    }

    let items_per_worker = n / p;
    let ranges = (0..p)
        .map(|worker| {
            let lower = worker * items_per_worker;
            let upper = if worker == p - 1 { n } else { lower + items_per_worker };
            lower..upper
        })
        .collect();
    Ok(ranges)
}

/// 分割表に従ってスライスを各ワーカー専用の可変スライスに切り分ける
pub fn split_by_ranges<'a, T>(mut data: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut chunks = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = data.split_at_mut(range.len());
        chunks.push(head);
        data = tail;
    }
    chunks
}
