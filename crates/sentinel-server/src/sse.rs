//! Server-sent event encoding for fragment streams.

use actix_web::web::Bytes;
use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sentinel_core::StreamFragment;
use sentinel_llm::FragmentStream;

pub const DONE_EVENT: &str = "data: [DONE]\n\n";

/// Channel depth between the generation task and the HTTP response.
pub const SSE_CHANNEL_CAPACITY: usize = 32;

pub fn encode_fragment(fragment: &StreamFragment) -> Bytes {
    match fragment {
        StreamFragment::Text { content } => {
            Bytes::from(format!("data: {}\n\n", json!({ "content": content })))
        }
        StreamFragment::Done => Bytes::from_static(DONE_EVENT.as_bytes()),
    }
}

/// Drive `fragments` on a background task, sending encoded events into `tx`.
///
/// When the receiving side goes away (client disconnect) the token is cancelled and
/// the fragment stream is dropped, which releases the backend connection.
pub fn spawn_sse_sender(
    mut fragments: FragmentStream,
    tx: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let fragment = tokio::select! {
                biased;
                _ = tx.closed() => None,
                next = fragments.next() => match next {
                    Some(fragment) => Some(fragment),
                    None => break,
                },
            };

            let Some(fragment) = fragment else {
                log::debug!("Client went away, cancelling turn");
                cancel.cancel();
                break;
            };

            if tx.send(encode_fragment(&fragment)).await.is_err() {
                log::debug!("Client went away, cancelling turn");
                cancel.cancel();
                break;
            }
            if fragment.is_done() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn text_fragment_is_json_data_event() {
        let bytes = encode_fragment(&StreamFragment::text("SELECT \"name\"\nFROM t"));
        assert_eq!(
            &bytes[..],
            b"data: {\"content\":\"SELECT \\\"name\\\"\\nFROM t\"}\n\n"
        );
    }

    #[test]
    fn done_is_literal_sentinel() {
        assert_eq!(&encode_fragment(&StreamFragment::Done)[..], b"data: [DONE]\n\n");
    }

    #[tokio::test]
    async fn sender_forwards_until_done() {
        let fragments: FragmentStream = Box::pin(stream::iter(vec![
            StreamFragment::text("a"),
            StreamFragment::text("b"),
            StreamFragment::Done,
        ]));
        let (tx, mut rx) = mpsc::channel(SSE_CHANNEL_CAPACITY);

        spawn_sse_sender(fragments, tx, CancellationToken::new())
            .await
            .unwrap();

        let mut out = Vec::new();
        while let Some(bytes) = rx.recv().await {
            out.push(String::from_utf8(bytes.to_vec()).unwrap());
        }
        assert_eq!(
            out,
            vec![
                "data: {\"content\":\"a\"}\n\n",
                "data: {\"content\":\"b\"}\n\n",
                "data: [DONE]\n\n",
            ]
        );
    }

    #[tokio::test]
    async fn dropped_receiver_cancels_the_turn() {
        let fragments: FragmentStream = Box::pin(stream::iter(vec![StreamFragment::text("a")]));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let cancel = CancellationToken::new();

        spawn_sse_sender(fragments, tx, cancel.clone()).await.unwrap();
        assert!(cancel.is_cancelled());
    }
}
