use num::Float;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ParseError, Result};
use crate::utils::sentinel::{is_unknown, unknown};

/// GrowBufferは未知値(NaN)で埋めた、インデックス直アクセスの可変長バッファです
///
/// 容量は暗黙に伸びません。
/// `initial + k * increment` の形でのみ増加し、`index` を収める最小の容量が選ばれます。
/// 新しく確保したスロットは全て未知値で埋められます。
///
/// slot 0 は常に存在しますが、feature id としては使われません。
#[derive(Debug, Clone, Serialize)]
pub struct GrowBuffer<N>
where
    N: Float,
{
    slots: Vec<N>,
    increment: usize,
}

impl<N> GrowBuffer<N>
where
    N: Float,
{
    /// `capacity` 個の未知値スロットで初期化
    #[inline]
    pub fn with_capacity(capacity: usize, increment: usize) -> Self {
        Self {
            slots: vec![unknown(); capacity.max(1)],
            increment: increment.max(1),
        }
    }

    /// 既存の値列をそのまま取り込む (長さ = 容量)
    #[inline]
    pub fn from_vec(mut slots: Vec<N>, increment: usize) -> Self {
        if slots.is_empty() {
            slots.push(unknown());
        }
        slots.shrink_to_fit();
        Self {
            slots,
            increment: increment.max(1),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn increment(&self) -> usize {
        self.increment
    }

    /// `index` を収める次の容量
    /// 現在の容量から increment 刻みで、`index` より真に大きい最小の値
    /// usize に収まらなければ None
    #[inline]
    pub fn next_capacity(&self, index: usize) -> Option<usize> {
        let cap = self.capacity();
        if index < cap {
            return Some(cap);
        }
        let step = self.increment.max(1);
        ((index - cap) / step + 1)
            .checked_mul(step)
            .and_then(|grow| cap.checked_add(grow))
    }

    /// 範囲外は未知値を返す
    #[inline]
    pub fn get(&self, index: usize) -> N {
        self.slots.get(index).copied().unwrap_or_else(unknown)
    }

    /// 値を書き込み、容量が足りなければ先に拡張します
    /// 確保できない場合は `CapacityOverflow` を返し、バッファは変更しません
    ///
    /// # Returns
    /// * `bool` - 拡張が発生した場合true
    #[inline]
    pub fn set(&mut self, index: usize, value: N) -> Result<bool> {
        let grew = index >= self.capacity();
        if grew {
            let new_cap = self
                .next_capacity(index)
                .ok_or(ParseError::CapacityOverflow { index })?;
            self.grow_to(new_cap, index)?;
        }
        self.slots[index] = value;
        Ok(grew)
    }

    /// 容量をちょうど `new_cap` にする
    /// コピー後、増えたスロットは未知値
    fn grow_to(&mut self, new_cap: usize, index: usize) -> Result<()> {
        let old_cap = self.capacity();
        debug_assert!(new_cap > old_cap);
        let mut grown: Vec<N> = Vec::new();
        if grown.try_reserve_exact(new_cap).is_err() {
            tracing::debug!(old_cap, new_cap, index, "feature buffer allocation refused");
            return Err(ParseError::CapacityOverflow { index });
        }
        grown.extend_from_slice(&self.slots);
        grown.resize(new_cap, unknown());
        self.slots = grown;
        tracing::trace!(old_cap, new_cap, "feature buffer grown");
        Ok(())
    }

    /// 容量を `len` まで切り詰める (slot 0 は残す)
    #[inline]
    pub fn shrink_to(&mut self, len: usize) {
        let len = len.max(1);
        if len < self.capacity() {
            self.slots.truncate(len);
            self.slots.shrink_to_fit();
        }
    }

    /// 既知値をもつ最大インデックス (slot 0 は除く)
    pub fn last_known(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, v)| !is_unknown(**v))
            .map(|(i, _)| i)
    }

    #[inline]
    pub fn as_slice(&self) -> &[N] {
        &self.slots
    }

    #[inline]
    pub fn into_vec(self) -> Vec<N> {
        self.slots
    }
}

impl<'de, N> Deserialize<'de> for GrowBuffer<N>
where
    N: Float + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as DeError;

        #[derive(Deserialize)]
        struct GrowBufferData<N> {
            slots: Vec<N>,
            increment: usize,
        }

        let data = GrowBufferData::<N>::deserialize(deserializer)?;
        if data.increment == 0 {
            return Err(DeError::custom("growth increment must be >= 1"));
        }
        if data.slots.is_empty() {
            return Err(DeError::custom("slot 0 is missing"));
        }
        if data.slots.iter().any(|v| v.is_infinite()) {
            return Err(DeError::custom("feature values must be finite or unknown"));
        }
        Ok(Self {
            slots: data.slots,
            increment: data.increment,
        })
    }
}
