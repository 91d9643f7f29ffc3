//! Index types for compressed sparse storage

/// Integer type used for CSR row pointers and column indices
pub trait SparseIndex:
    Copy + Ord + Default + core::fmt::Debug + Send + Sync + bytemuck::Pod + 'static
{
    /// Widen to usize
    fn to_usize(self) -> usize;

    /// Narrow from usize, `None` when the value does not fit
    fn from_usize(value: usize) -> Option<Self>;
}

macro_rules! impl_sparse_index {
    ($($t:ty),*) => {
        $(
            impl SparseIndex for $t {
                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_usize(value: usize) -> Option<Self> {
                    <$t>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_sparse_index!(u32, u64, usize);
