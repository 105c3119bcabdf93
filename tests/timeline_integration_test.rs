use ttml_timeline::{Breakpoint, ElementId, TimedText, TimedTextOptions, parse_ttml};

const TWO_PARAGRAPHS_TTML: &str = include_str!("test_data/two_paragraphs.ttml");
const SMPTE_TTML: &str = include_str!("test_data/smpte.ttml");
const STYLED_TTML: &str = include_str!("test_data/styled.ttml");

fn parse(content: &str) -> TimedText {
    parse_ttml(content, &TimedTextOptions::default()).expect("样本解析失败")
}

fn breakpoints(doc: &TimedText) -> Vec<f64> {
    doc.timeline()
        .breakpoints()
        .iter()
        .map(Breakpoint::milliseconds)
        .collect()
}

#[test]
fn test_two_paragraphs_are_active_one_at_a_time() {
    let doc = parse(TWO_PARAGRAPHS_TTML);
    let first = doc.element_by_xml_id("first").unwrap();
    let second = doc.element_by_xml_id("second").unwrap();

    assert_eq!(breakpoints(&doc), vec![2000.0, 5760.0, 5800.0, 7720.0]);

    for t in [2.0, 2.5, 4.0, 5.7, 5.759] {
        assert_eq!(doc.active_elements(t), vec![first], "t={t}");
    }
    for t in [5.8, 6.5, 7.0, 7.719] {
        assert_eq!(doc.active_elements(t), vec![second], "t={t}");
    }
    for t in [0.0, 1.0, 5.76, 5.77, 7.72, 8.0, 3600.0] {
        assert!(doc.active_elements(t).is_empty(), "t={t}");
    }
}

#[test]
fn test_times_just_inside_and_outside_an_interval() {
    let doc = parse(TWO_PARAGRAPHS_TTML);
    let first = doc.element_by_xml_id("first").unwrap();
    let second = doc.element_by_xml_id("second").unwrap();

    for t in [5.7596, 5.7599] {
        assert_eq!(doc.active_elements(t), vec![first], "t={t}");
    }
    assert_eq!(doc.active_elements(7.7196), vec![second]);
    assert!(doc.active_elements(1.9996).is_empty());
    assert!(doc.active_elements(5.7999).is_empty());
}

#[test]
fn test_smpte_frames_are_converted_at_parse_time() {
    let doc = parse(SMPTE_TTML);
    assert_eq!(breakpoints(&doc), vec![2067.0, 4000.0, 5001.0]);

    let paragraphs: Vec<ElementId> = doc.timeline().breakpoints()[0].active().to_vec();
    assert_eq!(paragraphs.len(), 1);
    assert_eq!(doc.text_content(paragraphs[0]), "Frame accurate");

    assert!(doc.active_elements(2.066).is_empty());
    assert_eq!(doc.active_elements(2.067), paragraphs);

    let at_four = doc.active_elements(4.0);
    assert_eq!(at_four.len(), 1);
    assert_eq!(doc.text_content(at_four[0]), "Short");
    assert!(doc.active_elements(5.001).is_empty());
}

#[test]
fn test_tick_based_container_timing() {
    let doc = parse(STYLED_TTML);
    assert_eq!(breakpoints(&doc), vec![1000.0, 5000.0]);

    let active = doc.active_elements(1.0);
    assert_eq!(active.len(), 1);
    assert_eq!(
        doc.element(active[0]).map(|e| e.kind()),
        Some(ttml_timeline::ElementKind::Div)
    );
    // 子元素没有自己的计时，不会出现在时间轴上
    assert!(doc.active_elements(4.999).iter().all(|id| *id == active[0]));
    assert!(doc.active_elements(5.0).is_empty());
}

#[test]
fn test_timeline_can_be_rebuilt_and_destroyed() {
    let mut doc = parse(TWO_PARAGRAPHS_TTML);
    let before = doc.timeline().clone();
    doc.build_timeline();
    assert_eq!(doc.timeline(), &before);

    doc.destroy();
    assert!(doc.is_destroyed());
    assert!(doc.root().is_none());
    assert!(doc.body().is_none());
    assert!(doc.timeline().is_empty());
    assert!(doc.active_elements(3.0).is_empty());
    assert!(doc.element_by_xml_id("first").is_none());
}

#[test]
fn test_concurrent_queries_share_one_document() {
    let doc = parse(TWO_PARAGRAPHS_TTML);
    let first = doc.element_by_xml_id("first").unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| doc.active_elements(3.0)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec![first]);
        }
    });
}
