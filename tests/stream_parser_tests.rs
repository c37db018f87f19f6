use cli_agent::api::stream::StreamParser;
use cli_agent::types::FinishReason;

#[test]
fn test_frame_split_across_chunks() {
    let mut parser = StreamParser::new();

    let first = parser
        .process(b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"te");
    assert!(first.is_empty());

    let second = parser
        .process(b"xt\":\"Hello\"}]}}]}\n\n");
    assert_eq!(second.len(), 1);
    let parts = &second[0].candidates[0]
        .content
        .as_ref()
        .expect("content")
        .parts;
    assert_eq!(parts[0].text.as_deref(), Some("Hello"));
}

#[test]
fn test_multibyte_character_split_between_chunks() {
    let mut parser = StreamParser::new();
    let frame = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"héllo\"}]}}]}\n\n";
    let bytes = frame.as_bytes();
    let split = frame.find('é').expect("accent") + 1;

    assert!(parser.process(&bytes[..split]).is_empty());
    let responses = parser.process(&bytes[split..]);
    let text = responses[0].candidates[0]
        .content
        .as_ref()
        .and_then(|content| content.parts[0].text.clone());
    assert_eq!(text.as_deref(), Some("héllo"));
}

#[test]
fn test_malformed_frame_is_skipped() {
    let mut parser = StreamParser::new();
    let responses = parser
        .process(b"data: {not json}\n\ndata: {\"candidates\":[]}\n\n");
    assert_eq!(responses.len(), 1);
}

#[test]
fn test_crlf_frames_and_finish_reason() {
    let mut parser = StreamParser::new();
    let responses = parser
        .process(b"data: {\"candidates\":[{\"finishReason\":\"MAX_TOKENS\"}]}\r\n\r\n");
    assert_eq!(
        responses[0].candidates[0].finish_reason,
        Some(FinishReason::MaxTokens)
    );
}

#[test]
fn test_unknown_finish_reason_maps_to_other() {
    let mut parser = StreamParser::new();
    let responses = parser
        .process(b"data: {\"candidates\":[{\"finishReason\":\"SOMETHING_NEW\"}]}\n\n");
    let reason = responses[0].candidates[0].finish_reason.expect("reason");
    assert_eq!(reason, FinishReason::Other);
    assert!(!reason.is_normal());
}

#[test]
fn test_function_call_with_thought_signature() {
    let mut parser = StreamParser::new();
    let responses = parser
        .process(
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"functionCall\":{\"name\":\"list_files\",\"args\":{\"path\":\".\"}},\"thoughtSignature\":\"sig-1\"}]}}]}\n\n",
        );
    let part = &responses[0].candidates[0]
        .content
        .as_ref()
        .expect("content")
        .parts[0];
    let call = part.function_call.as_ref().expect("call");
    assert_eq!(call.name, "list_files");
    assert_eq!(call.args["path"], ".");
    assert_eq!(part.thought_signature.as_deref(), Some("sig-1"));
}

#[test]
fn test_prompt_feedback_block_reason() {
    let mut parser = StreamParser::new();
    let responses = parser
        .process(b"data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\n\n");
    assert!(responses[0].candidates.is_empty());
    assert_eq!(
        responses[0]
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref()),
        Some("SAFETY")
    );
}

#[test]
fn test_finish_decodes_unterminated_tail() {
    let mut parser = StreamParser::new();
    assert!(parser
        .process(b"data: {\"usageMetadata\":{\"totalTokenCount\":12}}")
        .is_empty());
    let responses = parser.finish();
    assert_eq!(responses.len(), 1);
    assert_eq!(
        responses[0].usage_metadata.as_ref().map(|usage| usage.total_token_count),
        Some(12)
    );
    assert!(parser.finish().is_empty());
}

#[test]
fn test_frames_fed_one_byte_at_a_time() {
    let mut parser = StreamParser::new();
    let stream = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"one\"}]}}]}\n\n\
                  data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"two\"}]}}]}\n\n";

    let mut texts = Vec::new();
    for byte in stream.as_bytes() {
        for response in parser.process(std::slice::from_ref(byte)) {
            let content = response.candidates[0].content.as_ref().expect("content");
            texts.push(content.parts[0].text.clone().unwrap_or_default());
        }
    }

    assert_eq!(texts, vec!["one".to_string(), "two".to_string()]);
    assert!(parser.finish().is_empty());
}
