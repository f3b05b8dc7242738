//! Module `framing`
//!
//! Reads newline-terminated envelope lines with a hard cap on how much of one
//! line is ever buffered. Oversize lines are skipped up to their newline and
//! invalid UTF-8 is reported per line, so neither ends the connection.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::ProtocolError;

/// Reads the next line, without its `\n` / `\r\n` terminator.
///
/// # Returns
///
/// * `Ok(None)` - The peer closed the stream.
/// * `Ok(Some(Ok(line)))` - One complete line of at most `max` bytes.
/// * `Ok(Some(Err(ProtocolError)))` - The line was too long or not UTF-8 and
///   has been consumed.
/// * `Err(io::Error)` - The stream failed.
pub async fn read_frame<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> io::Result<Option<Result<String, ProtocolError>>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();

    // Room for the body plus a `\r\n` terminator
    let limit = max.saturating_add(2);
    let n = (&mut *reader)
        .take(limit as u64)
        .read_until(b'\n', buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }

    if buf.last() != Some(&b'\n') && buf.len() >= limit {
        let skipped = skip_line(reader).await?;
        return Ok(Some(Err(ProtocolError::MessageTooLong {
            len: buf.len() + skipped,
            max,
        })));
    }

    let body = trim_terminator(buf);
    if body.len() > max {
        return Ok(Some(Err(ProtocolError::MessageTooLong {
            len: body.len(),
            max,
        })));
    }

    Ok(Some(
        String::from_utf8(body.to_vec()).map_err(ProtocolError::InvalidEncoding),
    ))
}

/// Discards input up to and including the next newline, returning how many
/// bytes came before it.
async fn skip_line<R>(reader: &mut R) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let (used, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(skipped);
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(used);
        if done {
            return Ok(skipped + used - 1);
        }
        skipped += used;
    }
}

fn trim_terminator(buf: &[u8]) -> &[u8] {
    let body = buf.strip_suffix(b"\n").unwrap_or(buf);
    body.strip_suffix(b"\r").unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn frames(input: &[u8], max: usize) -> Vec<Result<String, String>> {
        let mut reader = BufReader::with_capacity(4, input);
        let mut buf = Vec::new();
        let mut out = Vec::new();
        while let Some(frame) = read_frame(&mut reader, &mut buf, max).await.unwrap() {
            out.push(frame.map_err(|e| e.to_string()));
        }
        out
    }

    #[tokio::test]
    async fn splits_lines_and_strips_terminators() {
        let out = frames(b"one\ntwo\r\n\nlast", 16).await;
        assert_eq!(
            out,
            vec![
                Ok("one".to_string()),
                Ok("two".to_string()),
                Ok(String::new()),
                Ok("last".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn body_of_exactly_max_bytes_is_accepted() {
        let out = frames(b"abcd\r\nabcd\nabcde\n", 4).await;
        assert_eq!(out[0], Ok("abcd".to_string()));
        assert_eq!(out[1], Ok("abcd".to_string()));
        assert!(out[2].as_ref().unwrap_err().contains("exceeds limit of 4"));
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn oversize_line_is_skipped_to_next_newline() {
        let mut input = vec![b'x'; 100];
        input.extend_from_slice(b"\nok\n");
        let out = frames(&input, 8).await;

        assert_eq!(out.len(), 2);
        assert!(out[0].as_ref().unwrap_err().contains("100 bytes"));
        assert_eq!(out[1], Ok("ok".to_string()));
    }

    #[tokio::test]
    async fn invalid_utf8_is_reported_per_line() {
        let out = frames(b"\xff\xfe garbage\nping\n", 64).await;
        assert!(out[0].as_ref().unwrap_err().contains("UTF-8"));
        assert_eq!(out[1], Ok("ping".to_string()));
    }
}
