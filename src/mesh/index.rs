//! Typed keys for mesh elements.
//!
//! Vertices and faces are addressed by [`VertexId`] and [`FaceId`]. Both wrap
//! an integer chosen through the [`MeshIndex`] trait, so small meshes can use
//! `u16` keys and very large ones `u64`. The default everywhere is `u32`.
//!
//! Keys are plain values: a key can exist without the element it names. A
//! face holding a key that the mesh never issued is exactly the kind of
//! corruption [`PolyMesh::validate`](super::PolyMesh::validate) reports.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Integer types usable as mesh keys.
pub trait MeshIndex:
    Copy + Eq + Ord + Hash + Debug + Display + Send + Sync + 'static
{
    /// Largest representable key.
    const MAX: Self;

    /// Convert from `usize`, or `None` if the value does not fit.
    fn try_from_usize(v: usize) -> Option<Self>;

    /// Convert to `usize`.
    fn to_usize(self) -> usize;

    /// Convert from `usize`.
    ///
    /// # Panics
    /// Panics in debug builds if the value does not fit.
    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(
            Self::try_from_usize(v).is_some(),
            "key {} does not fit in {}",
            v,
            std::any::type_name::<Self>()
        );
        Self::try_from_usize(v).unwrap_or(Self::MAX)
    }
}

macro_rules! impl_mesh_index {
    ($($t:ty),*) => {
        $(
            impl MeshIndex for $t {
                const MAX: Self = <$t>::MAX;

                #[inline]
                fn try_from_usize(v: usize) -> Option<Self> {
                    <$t>::try_from(v).ok()
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

/// Key of a vertex.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Key of a polygon face.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_key {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a key from a position in the mesh's storage.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Storage position this key refers to.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Underlying integer.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $tag, self.0)
            }
        }

        impl<I: MeshIndex> Display for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_key!(VertexId, "V");
impl_key!(FaceId, "F");
