use ipnet::IpNet;

use crate::{POOL_TAG, SEPARATOR};

/// Encodes a subnet and the range within it into a pool identifier of the form `weave-<subnet>-<range>`
#[must_use]
pub fn encode_pool_id(subnet: IpNet, range: IpNet) -> String {
    format!("{POOL_TAG}{SEPARATOR}{subnet}{SEPARATOR}{range}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_v4() {
        assert_eq!(
            encode_pool_id(
                "10.32.0.0/12".parse().unwrap(),
                "10.32.0.0/16".parse().unwrap()
            ),
            "weave-10.32.0.0/12-10.32.0.0/16"
        );
    }

    #[test]
    fn test_encode_whole_subnet() {
        let subnet = "172.30.0.0/16".parse().unwrap();
        assert_eq!(
            encode_pool_id(subnet, subnet),
            "weave-172.30.0.0/16-172.30.0.0/16"
        );
    }

    #[test]
    fn test_encode_v6() {
        assert_eq!(
            encode_pool_id(
                "fd00:ffff::/48".parse().unwrap(),
                "fd00:ffff:0:1::/64".parse().unwrap()
            ),
            "weave-fd00:ffff::/48-fd00:ffff:0:1::/64"
        );
    }
}
