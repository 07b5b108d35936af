pub mod amb;
pub mod catch_error;
pub mod combine_latest;
pub mod filter;
pub mod finalize;
pub mod group_by_until;
pub mod map;
pub mod materialize;
pub mod merge;
pub mod merge_all;
pub mod observe_on;
pub mod on_error_resume_next;
pub mod retry;
pub mod skip_until;
pub mod subscribe_on;
pub mod switch_latest;
pub mod take;
pub mod take_last;
pub mod take_until;
pub mod tap;
pub mod zip;

/// Tags the values of two heterogeneous sources so the binary combinators
/// can run them through one homogeneous n-ary core.
#[derive(Clone)]
pub(crate) enum CombineItem<A, B> {
  ItemA(A),
  ItemB(B),
}
