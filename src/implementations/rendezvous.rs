use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/*
  集約付きバリア

  全ワーカーが部分和を持って到着するまで待ち、最後に到着した1ワーカーだけが
  ワーカー番号順に部分和を合算して commit を実行する。
  commit の戻り値は世代番号を進めてから全員に配られる。
  共有フラグを直接読み書きせず、判定結果そのものをバリア越しに受け取る。

  次のラウンドの commit には全員の到着が必要なので、待機中のワーカーが
  結果を読む前に上書きされることはない。
*/
pub struct Rendezvous<T> {
    parties: usize,
    state: Mutex<RoundState<T>>,
    cvar: Condvar,
}

struct RoundState<T> {
    partials: Vec<f64>,
    arrived: usize,
    generation: u64,
    committed: T,
}

impl<T: Copy + Default> Rendezvous<T> {
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "Rendezvous には1つ以上の参加者が必要です");
        Rendezvous {
            parties,
            state: Mutex::new(RoundState {
                partials: vec![0.0; parties],
                arrived: 0,
                generation: 0,
                committed: T::default(),
            }),
            cvar: Condvar::new(),
        }
    }

    /// 部分和を提出して、このラウンドの確定値を受け取る
    pub fn arrive<F>(&self, worker: usize, partial: f64, commit: F) -> T
    where
        F: FnOnce(f64) -> T,
    {
        let mut state = self.lock();
        state.partials[worker] = partial;
        state.arrived += 1;

        if state.arrived == self.parties {
            let total: f64 = state.partials.iter().sum();
            let value = commit(total);
            state.committed = value;
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            return value;
        }

        let generation = state.generation;
        let state = self
            .cvar
            .wait_while(state, |s| s.generation == generation)
            .unwrap_or_else(PoisonError::into_inner);
        state.committed
    }

    fn lock(&self) -> MutexGuard<'_, RoundState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
