//! Per-connection session state.

use admuse_core::message::{ContentBlock, Conversation, ConversationId, Turn};
use serde::Deserialize;
use tracing::info;

use crate::media::MediaUploader;

/// A media attachment carried by a client `message` frame.
#[derive(Debug, Deserialize)]
pub struct MediaAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

/// One conversation bound to one WebSocket connection.
pub struct Session {
    conversation: Conversation,
}

impl Session {
    pub fn new(session_id: &str) -> Self {
        Self {
            conversation: Conversation::with_id(ConversationId::from(session_id)),
        }
    }

    /// Build and append the user turn for one client message.
    ///
    /// Block order: image blocks first, then the text block, then a
    /// system-visible note listing CDN URLs for any images that uploaded
    /// successfully (so the model can pass them to tools). Returns `false`
    /// when the message carried no content; nothing is appended and the
    /// caller skips the turn.
    pub async fn submit_turn(
        &mut self,
        text: &str,
        media: &[MediaAttachment],
        uploader: &MediaUploader,
    ) -> bool {
        let mut content = Vec::new();
        let mut uploaded_urls = Vec::new();

        for attachment in media {
            if attachment.kind != "image" {
                continue;
            }
            content.push(ContentBlock::image(
                attachment.media_type.clone(),
                attachment.data.clone(),
            ));
            if let Some(url) = uploader
                .upload_base64(&attachment.data, &attachment.media_type)
                .await
            {
                uploaded_urls.push(url);
            }
        }

        let text = text.trim();
        if !text.is_empty() {
            content.push(ContentBlock::text(text));
        }

        if !uploaded_urls.is_empty() {
            content.push(ContentBlock::text(format!(
                "[System: The user uploaded images. Available image URLs for use with tools: {}]",
                uploaded_urls.join(", ")
            )));
        }

        if content.is_empty() {
            return false;
        }

        self.conversation.push(Turn::user(content));
        true
    }

    /// Reset the history, keeping the session id.
    pub fn clear(&mut self) {
        info!(conversation_id = %self.conversation.id, "clearing history");
        self.conversation.clear();
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader() -> MediaUploader {
        // No key: uploads are skipped, no network is touched.
        MediaUploader::new(None)
    }

    #[tokio::test]
    async fn text_only_turn() {
        let mut session = Session::new("s1");
        assert!(session.submit_turn("hello", &[], &uploader()).await);

        let turn = &session.conversation().turns[0];
        assert_eq!(turn.content, vec![ContentBlock::text("hello")]);
    }

    #[tokio::test]
    async fn empty_message_is_ignored() {
        let mut session = Session::new("s1");
        assert!(!session.submit_turn("   ", &[], &uploader()).await);
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn images_precede_text() {
        let mut session = Session::new("s1");
        let media = vec![MediaAttachment {
            kind: "image".into(),
            media_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        }];
        assert!(session.submit_turn("what is this?", &media, &uploader()).await);

        let turn = &session.conversation().turns[0];
        assert_eq!(turn.content.len(), 2);
        assert!(matches!(turn.content[0], ContentBlock::Image { .. }));
        assert_eq!(turn.content[1], ContentBlock::text("what is this?"));
    }

    #[tokio::test]
    async fn non_image_media_is_skipped() {
        let mut session = Session::new("s1");
        let media = vec![MediaAttachment {
            kind: "audio".into(),
            media_type: "audio/mp3".into(),
            data: "aGVsbG8=".into(),
        }];
        assert!(!session.submit_turn("", &media, &uploader()).await);
    }

    #[tokio::test]
    async fn clear_empties_history() {
        let mut session = Session::new("s1");
        session.submit_turn("hello", &[], &uploader()).await;
        assert_eq!(session.conversation().len(), 1);

        session.clear();
        assert!(session.conversation().is_empty());
    }
}
