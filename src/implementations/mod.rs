pub mod single;
pub mod rayon;
pub mod barrier;
pub mod rendezvous;
pub mod shared;
