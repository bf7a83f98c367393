use anyhow::Result;

// splits "data:<mime>;base64,<payload>" into the mime type and the payload
pub fn split_data_url(data_url: &str) -> Result<(&str, &str)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| anyhow::Error::msg("not a data url"))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow::Error::msg("data url has no payload"))?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow::Error::msg("data url is not base64 encoded"))?;

    if mime.is_empty() {
        return Err(anyhow::Error::msg("data url has no mime type"));
    }

    Ok((mime, payload))
}

// atob() hands back a "binary string", one char per byte
pub fn binary_string_bytes(binary: &str) -> Result<Vec<u8>> {
    binary
        .chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .map_err(|_| anyhow::Error::msg(format!("{c:?} is not a byte")))
        })
        .collect()
}
