use ipnet::IpNet;

use crate::{
    error::Error,
    pool::{AddressPool, PoolId},
    LEGACY_POOL_ID, POOL_TAG, SEPARATOR,
};

/// Parses CIDR text into the network it denotes, clearing any host bits.
///
/// `10.32.1.7/12` parses to `10.32.0.0/12`.
pub fn parse_cidr(text: &str) -> Result<IpNet, Error> {
    text.parse::<IpNet>()
        .map(|net| net.trunc())
        .map_err(|source| Error::InvalidCidr {
            text: text.to_owned(),
            source,
        })
}

/// Decodes a pool identifier produced by [`encode_pool_id`](crate::encode_pool_id), or the legacy identifier
pub fn decode_pool_id(id: &str) -> Result<PoolId, Error> {
    if id == LEGACY_POOL_ID {
        return Ok(PoolId::Legacy);
    }

    // Exactly three parts, the first of which is our tag
    let parts: Vec<&str> = id.split(SEPARATOR).collect();
    let [tag, subnet, range] = parts.as_slice() else {
        return Err(Error::InvalidPoolId(id.to_owned()));
    };
    if *tag != POOL_TAG {
        return Err(Error::InvalidPoolId(id.to_owned()));
    }

    Ok(PoolId::Encoded(AddressPool::new(
        parse_cidr(subnet)?,
        parse_cidr(range)?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_pool_id;

    #[test]
    fn test_decode_v4() {
        assert_eq!(
            decode_pool_id("weave-10.32.0.0/12-10.32.0.0/16").unwrap(),
            PoolId::Encoded(AddressPool::new(
                "10.32.0.0/12".parse().unwrap(),
                "10.32.0.0/16".parse().unwrap()
            ))
        );
    }

    #[test]
    fn test_decode_legacy() {
        assert_eq!(decode_pool_id("weavepool").unwrap(), PoolId::Legacy);
    }

    #[test]
    fn test_round_trip() {
        for (subnet, range) in [
            ("10.32.0.0/12", "10.32.0.0/12"),
            ("10.32.0.0/12", "10.40.128.0/17"),
            ("192.168.0.0/16", "192.168.3.0/24"),
            ("fd00:ffff::/48", "fd00:ffff:0:1::/64"),
        ] {
            let (subnet, range) = (subnet.parse().unwrap(), range.parse().unwrap());
            assert_eq!(
                decode_pool_id(&encode_pool_id(subnet, range)).unwrap(),
                PoolId::Encoded(AddressPool::new(subnet, range))
            );
        }
    }

    #[test]
    fn test_decode_wrong_shape() {
        for id in [
            "",
            "weave",
            "weave-10.32.0.0/12",
            "weave-10.32.0.0/12-10.32.0.0/16-extra",
            "other-10.32.0.0/12-10.32.0.0/16",
            "WEAVE-10.32.0.0/12-10.32.0.0/16",
        ] {
            assert!(
                matches!(decode_pool_id(id), Err(Error::InvalidPoolId(_))),
                "{id:?} should not decode"
            );
        }
    }

    #[test]
    fn test_decode_bad_cidr() {
        assert!(matches!(
            decode_pool_id("weave-10.32.0.0-10.32.0.0/16"),
            Err(Error::InvalidCidr { .. })
        ));
        assert!(matches!(
            decode_pool_id("weave-10.32.0.0/12-10.300.0.0/16"),
            Err(Error::InvalidCidr { .. })
        ));
    }

    #[test]
    fn test_parse_cidr_clears_host_bits() {
        assert_eq!(
            parse_cidr("10.32.1.7/12").unwrap(),
            "10.32.0.0/12".parse::<IpNet>().unwrap()
        );
        assert_eq!(
            parse_cidr("fd00:ffff::1/48").unwrap(),
            "fd00:ffff::/48".parse::<IpNet>().unwrap()
        );
    }
}
