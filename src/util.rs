#[inline(always)]
#[cold]
pub(crate) fn cold_path() {}

#[cfg(feature = "nbt")]
pub trait ByteOrder: zerocopy::ByteOrder + Send + Sync + 'static {}

#[cfg(feature = "nbt")]
impl<T: zerocopy::ByteOrder + Send + Sync + 'static> ByteOrder for T {}
