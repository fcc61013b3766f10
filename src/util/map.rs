use std::{collections::HashSet, hash::Hash};

/// 帳本記錄的自然鍵
pub trait Keyable {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

/// 收集所有實體的鍵，重複的鍵只保留一份
pub fn key_set<'a, T, I>(entities: I) -> HashSet<T::Key>
where
    T: Keyable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    entities.into_iter().map(|e| e.key()).collect()
}
