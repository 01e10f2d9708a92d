//! 送信元 IP の許可リスト

use std::collections::HashSet;

/// 許可された IP アドレスの集合
///
/// 起動時に設定から一度だけ構築され、以後変更されない。
/// 空の場合はすべてのリクエストを許可する（オープンモード）。
/// CIDR や部分一致はサポートしない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedIps {
    entries: HashSet<String>,
}

impl AllowedIps {
    /// カンマ区切りの文字列から構築する
    ///
    /// 各要素は前後の空白を除去し、空要素は無視する。
    pub fn parse(list: &str) -> Self {
        Self::from_entries(list.split(','))
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// オープンモードかどうか
    pub fn is_open(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// クライアント IP が許可されているか
    ///
    /// 大文字小文字を区別し、前後の空白のみ除去して比較する。
    pub fn permits(&self, client_ip: &str) -> bool {
        self.is_open() || self.entries.contains(client_ip.trim())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn 空リストはすべて許可する() {
        let allowed = AllowedIps::parse("");

        assert!(allowed.is_open());
        assert!(allowed.permits("203.0.113.9"));
    }

    #[test]
    fn 空白と空要素のみのリストはオープンモード() {
        let allowed = AllowedIps::parse(" , ,");

        assert!(allowed.is_open());
    }

    #[rstest]
    #[case("10.0.0.1", true)]
    #[case(" 10.0.0.1 ", true)]
    #[case("10.0.0.2", false)]
    #[case("10.0.0.10", false)]
    #[case("10.0.0", false)]
    fn 完全一致でのみ許可する(#[case] client_ip: &str, #[case] expected: bool) {
        let allowed = AllowedIps::parse("10.0.0.1");

        assert_eq!(allowed.permits(client_ip), expected);
    }

    #[test]
    fn 設定値の前後の空白は除去される() {
        let allowed = AllowedIps::parse(" 10.0.0.1 , 192.168.1.5,");

        assert_eq!(allowed.len(), 2);
        assert!(allowed.permits("192.168.1.5"));
    }

    #[test]
    fn 比較は大文字小文字を区別する() {
        let allowed = AllowedIps::parse("fe80::ABCD");

        assert!(allowed.permits("fe80::ABCD"));
        assert!(!allowed.permits("fe80::abcd"));
    }
}
