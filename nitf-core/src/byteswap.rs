//! Endian normalisation of pixel buffers.
//!
//! NITF stores multi-byte pixel values big-endian. On little-endian hosts the
//! image engines swap every element of the user buffer after unpacking (and
//! before packing on the write side). The swap can be striped over worker
//! threads; each stripe is a disjoint slice, so the result is identical for
//! any stripe count.

/// Whether pixel buffers need swapping on this host. Carried as a constant
/// so the swap stage can be compiled out on big-endian targets.
pub const HOST_IS_LE: bool = cfg!(target_endian = "little");

/// Reverse the bytes of every `elem`-sized element of `buf` in place.
///
/// `buf.len()` must be a multiple of `elem`.
///
/// ```
/// use nitf_core::byteswap::swap_in_place;
///
/// let mut buf = vec![0x12, 0x34, 0x56, 0x78];
/// swap_in_place(&mut buf, 2);
/// assert_eq!(buf, [0x34, 0x12, 0x78, 0x56]);
/// swap_in_place(&mut buf, 2);
/// assert_eq!(buf, [0x12, 0x34, 0x56, 0x78]);
/// ```
pub fn swap_in_place(buf: &mut [u8], elem: usize) {
    debug_assert_eq!(buf.len() % elem, 0);
    if elem < 2 {
        return;
    }
    for chunk in buf.chunks_exact_mut(elem) {
        chunk.reverse();
    }
}

/// Swap with the work striped over up to `threads` scoped workers.
///
/// Stripes are cut at element boundaries, so this is semantically identical
/// to [`swap_in_place`] for every thread count.
pub fn swap_striped(buf: &mut [u8], elem: usize, threads: usize) {
    if elem < 2 || buf.is_empty() {
        return;
    }
    let elems = buf.len() / elem;
    let threads = threads.max(1).min(elems);
    if threads == 1 {
        swap_in_place(buf, elem);
        return;
    }
    let per_stripe = (elems + threads - 1) / threads * elem;
    std::thread::scope(|scope| {
        for stripe in buf.chunks_mut(per_stripe) {
            scope.spawn(move || swap_in_place(stripe, elem));
        }
    });
}
