/// feature id (u32) をキーに inds / vals を並べ替える (LSD radix, 安定)
///
/// 最大キーのバイト数だけパスを回す。
/// feature id は大抵 1 ~ 2 バイトに収まるので、4 パス全部は回らない。
#[inline]
pub fn radix_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    assert_eq!(inds.len(), vals.len());
    if inds.len() < 2 || is_sorted(inds) {
        return;
    }
    let max = inds.iter().copied().max().unwrap_or(0);
    let passes = (32 - max.leading_zeros()).div_ceil(8).max(1);

    let mut keys: Vec<u32> = inds.to_vec();
    let mut payload: Vec<N> = vals.to_vec();
    let mut keys_out: Vec<u32> = keys.clone();
    let mut payload_out: Vec<N> = payload.clone();

    for pass in 0..passes {
        scatter_by_byte(&keys, &payload, &mut keys_out, &mut payload_out, pass * 8);
        std::mem::swap(&mut keys, &mut keys_out);
        std::mem::swap(&mut payload, &mut payload_out);
    }
    inds.copy_from_slice(&keys);
    vals.copy_from_slice(&payload);
}

/// 1 パス分: `shift` のバイトで数え上げて配置
fn scatter_by_byte<N: Copy>(keys: &[u32], payload: &[N], keys_out: &mut [u32], payload_out: &mut [N], shift: u32) {
    let digit = |k: u32| ((k >> shift) & 0xFF) as usize;

    let mut starts = [0usize; 256];
    for &k in keys {
        starts[digit(k)] += 1;
    }
    let mut offset = 0usize;
    for slot in starts.iter_mut() {
        offset += std::mem::replace(slot, offset);
    }
    for (&k, &v) in keys.iter().zip(payload) {
        let pos = &mut starts[digit(k)];
        keys_out[*pos] = k;
        payload_out[*pos] = v;
        *pos += 1;
    }
}

#[inline]
fn is_sorted(keys: &[u32]) -> bool {
    keys.windows(2).all(|w| w[0] <= w[1])
}

/// ソート済み SoA から重複キーを取り除く
/// 同じキーが並んでいれば最後の値を残す (last-write-wins)
///
/// # Returns
/// * `usize` - 取り除いた要素数
pub fn dedup_last_wins_soa<N: Copy>(inds: &mut Vec<u32>, vals: &mut Vec<N>) -> usize {
    debug_assert_eq!(inds.len(), vals.len());
    let before = inds.len();
    let mut kept = 0usize;
    for i in 0..before {
        if kept > 0 && inds[kept - 1] == inds[i] {
            vals[kept - 1] = vals[i];
            continue;
        }
        inds[kept] = inds[i];
        vals[kept] = vals[i];
        kept += 1;
    }
    inds.truncate(kept);
    vals.truncate(kept);
    before - kept
}
