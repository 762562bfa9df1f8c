use bubbly_core::annotations::TagAssignments;
use bubbly_core::collection::{MessageEntry, MessageLog};
use bubbly_core::filter::{apply, FilterCriteria, TimeBounds, TimePreset, DAY_MS};
use bubbly_core::media::MediaKind;
use bubbly_core::models::{AnnotationTag, FacetOption, Message};
use bubbly_core::selection::{SelectionControl, SelectionMode};
use bubbly_core::timestamp::{parse_timestamp, TimestampParser};

struct Facets {
    chat: SelectionControl,
    sender: SelectionControl,
    media: SelectionControl,
    tags: SelectionControl,
}

impl Facets {
    fn new(log: &MessageLog) -> Self {
        let plain = |values: Vec<String>| -> Vec<FacetOption> { values.into_iter().map(FacetOption::plain).collect() };
        Self {
            chat: SelectionControl::with_options(SelectionMode::Single, plain(log.chats())),
            sender: SelectionControl::with_options(SelectionMode::Multi, plain(log.senders(None))),
            media: SelectionControl::with_options(SelectionMode::Multi, MediaKind::facet_options()),
            tags: SelectionControl::with_options(
                SelectionMode::Multi,
                AnnotationTag::ALL.iter().map(|t| FacetOption::plain(t.name())).collect(),
            ),
        }
    }

    fn criteria<'a>(&'a self, search: &'a str, time: TimeBounds) -> FilterCriteria<'a> {
        FilterCriteria {
            chat: &self.chat,
            sender: &self.sender,
            media: &self.media,
            tags: &self.tags,
            search,
            time,
        }
    }
}

fn sample_messages() -> Vec<Message> {
    vec![
        Message::new("Alice", "Morning all", "01/03/2024, 09:00").in_chat("A"),
        Message::new("Bob", "Photo from the trip", "01/03/2024, 09:05")
            .in_chat("A")
            .with_media("trip.jpg", None),
        Message::new("Bob", "Invoice attached", "2024-03-02T10:00:00Z")
            .in_chat("B")
            .with_media("invoice.bin", Some("application/pdf")),
        Message::new("Bob", "See you later", "garbage").in_chat("A"),
        Message::new("Cara", "Running late", "02.03.2024, 08:00").in_chat("B"),
    ]
}

fn media_messages() -> Vec<Message> {
    vec![
        Message::new("Ann", "picture", "2024-01-01 10:00:00").with_media("a.PNG", None),
        Message::new("Ann", "clip", "2024-01-01 10:01:00").with_media("b.mp4", None),
        Message::new("Ann", "voice", "2024-01-01 10:02:00").with_media("c.bin", Some("audio/ogg")),
        Message::new("Ann", "doc", "2024-01-01 10:03:00").with_media("d.pdf", None),
        Message::new("Ann", "text only", "2024-01-01 10:04:00"),
        Message::new("Ann", "lost photo", "2024-01-01 10:05:00").with_media("missing:e.jpg", None),
    ]
}

fn load(messages: Vec<Message>) -> MessageLog {
    MessageLog::new(messages, &TimestampParser::default())
}

fn contents(result: &[&MessageEntry]) -> Vec<String> {
    result.iter().map(|e| e.message.content.clone()).collect()
}

#[test]
fn empty_facets_return_everything_in_time_order() {
    let log = load(sample_messages());
    let facets = Facets::new(&log);
    let result = apply(log.entries(), &facets.criteria("", TimeBounds::default()), &TagAssignments::new());
    assert_eq!(
        contents(&result),
        vec![
            "Morning all",
            "Photo from the trip",
            "Running late",
            "Invoice attached",
            "See you later",
        ]
    );
}

#[test]
fn chat_and_sender_combine_with_and() {
    let log = load(sample_messages());
    let mut facets = Facets::new(&log);
    facets.chat.toggle("A");
    facets.sender.toggle("Bob");
    let result = apply(log.entries(), &facets.criteria("", TimeBounds::default()), &TagAssignments::new());
    assert_eq!(contents(&result), vec!["Photo from the trip", "See you later"]);
}

#[test]
fn sender_values_combine_with_or() {
    let log = load(sample_messages());
    let mut facets = Facets::new(&log);
    facets.sender.toggle("Alice");
    facets.sender.toggle("Cara");
    let result = apply(log.entries(), &facets.criteria("", TimeBounds::default()), &TagAssignments::new());
    assert_eq!(contents(&result), vec!["Morning all", "Running late"]);
}

#[test]
fn media_kinds_union_excludes_other_kinds_and_plain_messages() {
    let log = load(media_messages());
    let mut facets = Facets::new(&log);
    facets.media.toggle("image");
    facets.media.toggle("audio");
    let result = apply(log.entries(), &facets.criteria("", TimeBounds::default()), &TagAssignments::new());
    assert_eq!(contents(&result), vec!["picture", "voice", "lost photo"]);
}

#[test]
fn pdf_resolves_from_mime_or_extension() {
    let mut messages = sample_messages();
    messages.extend(media_messages());
    let log = load(messages);
    let mut facets = Facets::new(&log);
    facets.media.toggle("pdf");
    let result = apply(log.entries(), &facets.criteria("", TimeBounds::default()), &TagAssignments::new());
    assert_eq!(contents(&result), vec!["doc", "Invoice attached"]);
}

#[test]
fn tag_facet_keeps_messages_sharing_any_selected_tag() {
    let log = load(sample_messages());
    let mut assignments = TagAssignments::new();
    assignments
        .entry(log.entries()[0].key.clone())
        .or_default()
        .insert(AnnotationTag::Important);
    assignments
        .entry(log.entries()[4].key.clone())
        .or_default()
        .insert(AnnotationTag::FollowUp);
    assignments
        .entry(log.entries()[2].key.clone())
        .or_default()
        .insert(AnnotationTag::Relevant);

    let mut facets = Facets::new(&log);
    facets.tags.toggle("Important");
    facets.tags.toggle("Follow-up");
    let result = apply(log.entries(), &facets.criteria("", TimeBounds::default()), &assignments);
    assert_eq!(contents(&result), vec!["Morning all", "Running late"]);
}

#[test]
fn search_is_case_insensitive_over_content_and_sender() {
    let log = load(sample_messages());
    let facets = Facets::new(&log);
    let by_content = apply(log.entries(), &facets.criteria("INVOICE", TimeBounds::default()), &TagAssignments::new());
    assert_eq!(contents(&by_content), vec!["Invoice attached"]);

    let by_sender = apply(log.entries(), &facets.criteria("car", TimeBounds::default()), &TagAssignments::new());
    assert_eq!(contents(&by_sender), vec!["Running late"]);
}

#[test]
fn search_matches_tag_names() {
    let log = load(sample_messages());
    let mut assignments = TagAssignments::new();
    assignments
        .entry(log.entries()[3].key.clone())
        .or_default()
        .insert(AnnotationTag::FollowUp);
    let facets = Facets::new(&log);
    let result = apply(log.entries(), &facets.criteria("follow", TimeBounds::default()), &assignments);
    assert_eq!(contents(&result), vec!["See you later"]);
}

#[test]
fn active_time_bounds_drop_unparseable_timestamps() {
    let log = load(sample_messages());
    let facets = Facets::new(&log);
    let start = parse_timestamp("01/03/2024, 09:05").expect("start");
    let bounds = TimePreset::Custom { from: Some(start), to: None }.bounds(0);
    let result = apply(log.entries(), &facets.criteria("", bounds), &TagAssignments::new());
    assert_eq!(contents(&result), vec!["Photo from the trip", "Running late", "Invoice attached"]);
}

#[test]
fn last_24h_is_relative_to_now() {
    let log = load(sample_messages());
    let facets = Facets::new(&log);
    let now = parse_timestamp("2024-03-02T12:00:00Z").expect("now");
    let result = apply(
        log.entries(),
        &facets.criteria("", TimePreset::Last24Hours.bounds(now)),
        &TagAssignments::new(),
    );
    assert_eq!(contents(&result), vec!["Running late", "Invoice attached"]);

    let month = apply(
        log.entries(),
        &facets.criteria("", TimePreset::Last30Days.bounds(now + 40 * DAY_MS)),
        &TagAssignments::new(),
    );
    assert!(month.is_empty());
}
