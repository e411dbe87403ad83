// Scenario decoder tests
//
//  Copyright (C) 2014-2023 Ryan Specialty Group, LLC.
//
//  This file is part of sippscn.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

use super::*;
use crate::xml::Node;

fn decode_ok(text: &str) -> Scenario {
    decode(text).expect("decode failed")
}

fn only_step(text: &str) -> Step {
    let mut scenario = decode_ok(text);
    assert_eq!(scenario.steps.len(), 1, "expected exactly one step");
    scenario.steps.remove(0)
}

#[test]
fn pause_with_milliseconds() {
    let scenario = decode_ok(
        r#"<scenario name="T"><pause milliseconds="5000"/></scenario>"#,
    );

    assert_eq!(
        scenario,
        Scenario {
            name: "T".into(),
            steps: vec![
                Step::new(StepKind::Pause).with_attr("milliseconds", "5000")
            ],
            ..Default::default()
        }
    );
}

#[test]
fn recv_without_children() {
    let step = only_step(
        r#"<scenario><recv response="100" optional="true">
           </recv></scenario>"#,
    );

    assert_eq!(step.kind, StepKind::Recv);
    assert_eq!(step.payload, None);
    assert!(step.actions.is_empty());
    assert_eq!(step.attr("optional"), Some("true"));
    assert_eq!(step.attr("response"), Some("100"));
}

#[test]
fn nop_with_action_block_has_no_payload() {
    let step = only_step(
        r#"<scenario>
             <nop>
               <action>
                 <log message="x"/>
               </action>
             </nop>
           </scenario>"#,
    );

    assert_eq!(step.kind, StepKind::Nop);
    assert_eq!(step.payload, None);
    assert_eq!(
        step.actions,
        vec![Action::new("log").with_attr("message", "x")]
    );
}

#[test]
fn consecutive_recv_requests() {
    let scenario = decode_ok(
        r#"<scenario>
             <recv request="INVITE"></recv>
             <recv request="ACK"></recv>
           </scenario>"#,
    );

    let requests = scenario
        .steps
        .iter()
        .map(|step| step.attr("request"))
        .collect::<Vec<_>>();

    assert_eq!(requests, vec![Some("INVITE"), Some("ACK")]);
}

#[test]
fn missing_root() {
    assert!(matches!(decode("<root/>"), Err(Error::MissingRoot)));
}

#[test]
fn malformed_document() {
    assert!(matches!(
        decode("<scenario><send"),
        Err(Error::MalformedDocument(_))
    ));

    assert!(matches!(
        decode("<scenario><recv></scenario>"),
        Err(Error::MalformedDocument(_))
    ));
}

#[test]
fn malformed_document_carries_offset() {
    let offset = |text| decode(text).err().and_then(|e| e.offset());

    assert!(offset("<scenario><recv></scenario>").is_some());
    assert_eq!(offset("<scenario>\n<send>"), Some(17));
    assert_eq!(offset("<root/>"), None);
}

#[test]
fn missing_name_uses_fallback() {
    assert_eq!(decode_ok("<scenario/>").name, UNNAMED_SCENARIO);
    assert_eq!(decode_ok(r#"<scenario name=""/>"#).name, UNNAMED_SCENARIO);
}

#[test]
fn root_found_depth_first_ignoring_case() {
    let scenario = decode_ok(
        r#"<wrapper>
             <other/>
             <Scenario name="inner"><pause/></Scenario>
           </wrapper>"#,
    );

    assert_eq!(scenario.name, "inner");
    assert_eq!(scenario.steps.len(), 1);
}

#[test]
fn step_tags_ignore_case() {
    let scenario = decode_ok(
        "<scenario><SEND/><sendcmd/><RecvCmd/><TimeWait/></scenario>",
    );

    let kinds = scenario.steps.iter().map(|s| s.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            StepKind::Send,
            StepKind::SendCmd,
            StepKind::RecvCmd,
            StepKind::Timewait
        ]
    );
}

#[test]
fn unknown_children_are_ignored() {
    let scenario = decode_ok(
        r#"<scenario>
             <init><nop/></init>
             <pause/>
             <bogus attr="1"/>
           </scenario>"#,
    );

    assert_eq!(scenario.steps.len(), 1);
    assert_eq!(scenario.steps[0].kind, StepKind::Pause);
}

#[test]
fn attributes_are_unfiltered_strings_in_document_order() {
    let step = only_step(
        r#"<scenario>
             <send retrans="500" lost="10" start_txn="invite"
                   next="label1" test="$1" crlf=""/>
           </scenario>"#,
    );

    assert_eq!(
        step.attrs.iter().collect::<Vec<_>>(),
        vec![
            ("retrans", "500"),
            ("lost", "10"),
            ("start_txn", "invite"),
            ("next", "label1"),
            ("test", "$1"),
            ("crlf", ""),
        ]
    );
}

#[test]
fn cdata_payload_is_verbatim() {
    let step = only_step(
        "<scenario><send>\n    <![CDATA[\n\n\
         INVITE sip:[service]@[remote_ip] SIP/2.0\n\
         Content-Length: 0\n\n    ]]>\n  </send></scenario>",
    );

    assert_eq!(
        step.payload.as_deref(),
        Some(
            "\n\nINVITE sip:[service]@[remote_ip] SIP/2.0\n\
             Content-Length: 0\n\n    "
        )
    );
}

#[test]
fn multiple_cdata_sections_are_concatenated() {
    let step = only_step(
        "<scenario><send><![CDATA[a]]]]><![CDATA[>b]]></send></scenario>",
    );

    assert_eq!(step.payload.as_deref(), Some("a]]>b"));
}

#[test]
fn cdata_is_authoritative_alongside_action_block() {
    let step = only_step(
        r#"<scenario>
             <send>
               <![CDATA[MESSAGE]]>
               <action><ereg regexp="x" assign_to="1"/></action>
             </send>
           </scenario>"#,
    );

    assert_eq!(step.payload.as_deref(), Some("MESSAGE"));
    assert_eq!(step.actions.len(), 1);
}

#[test]
fn plain_text_payload_without_child_elements() {
    let step = only_step(
        "<scenario><sendCmd>\n  Call-ID: [call_id]\n</sendCmd></scenario>",
    );

    assert_eq!(step.kind, StepKind::SendCmd);
    assert_eq!(step.payload.as_deref(), Some("\n  Call-ID: [call_id]\n"));
}

#[test]
fn plain_text_is_unescaped() {
    let step = only_step("<scenario><label>a &amp; b</label></scenario>");

    assert_eq!(step.payload.as_deref(), Some("a & b"));
}

#[test]
fn whitespace_only_text_is_not_payload() {
    let step =
        only_step("<scenario><label id=\"1\">\n   \n</label></scenario>");

    assert_eq!(step.payload, None);
    assert_eq!(step.attr("id"), Some("1"));
}

#[test]
fn actions_in_order_with_lowercased_kinds() {
    let step = only_step(
        r#"<scenario>
             <recv response="180">
               <action>
                 <ereg regexp=".*" search_in="hdr" header="CSeq:"
                       check_it="true" assign_to="1"/>
                 <Log message="m"/>
                 <ereg regexp=".*" search_in="hdr" header="RSeq:"
                       check_it="true" assign_to="2"/>
                 <customthing foo="bar"/>
               </action>
             </recv>
           </scenario>"#,
    );

    let kinds =
        step.actions.iter().map(|a| a.kind.as_str()).collect::<Vec<_>>();
    assert_eq!(kinds, vec!["ereg", "log", "ereg", "customthing"]);

    assert_eq!(step.actions[0].attrs.get("header"), Some("CSeq:"));
    assert_eq!(step.actions[2].attrs.get("header"), Some("RSeq:"));
    assert_eq!(
        step.actions[0].attrs.iter().map(|(k, _)| k).collect::<Vec<_>>(),
        vec!["regexp", "search_in", "header", "check_it", "assign_to"]
    );
}

#[test]
fn only_first_action_block_is_used() {
    let step = only_step(
        r#"<scenario><nop>
             <action><log message="first"/></action>
             <action><log message="second"/></action>
           </nop></scenario>"#,
    );

    assert_eq!(step.actions.len(), 1);
    assert_eq!(step.actions[0].attrs.get("message"), Some("first"));
}

#[test]
fn attribute_only_kinds_never_carry_actions() {
    let step = only_step(
        r#"<scenario>
             <pause><action><log message="x"/></action></pause>
           </scenario>"#,
    );

    assert!(step.actions.is_empty());
}

#[test]
fn repartitions_and_references() {
    let scenario = decode_ok(
        r#"<scenario>
             <responsetimerepartition value="10, 20, 30"/>
             <CallLengthRepartition value="10, 50, 100"/>
             <Reference variables="a,b"/>
             <REFERENCE/>
           </scenario>"#,
    );

    assert_eq!(
        scenario.response_time_repartition.as_deref(),
        Some("10, 20, 30")
    );
    assert_eq!(
        scenario.call_length_repartition.as_deref(),
        Some("10, 50, 100")
    );
    assert_eq!(scenario.references, vec!["a,b".to_string(), String::new()]);
}

#[test]
fn repartition_without_value_is_empty() {
    let scenario = decode_ok("<scenario><ResponseTimeRepartition/></scenario>");

    assert_eq!(scenario.response_time_repartition.as_deref(), Some(""));
    assert_eq!(scenario.call_length_repartition, None);
}

/// Serves a fixed tree regardless of input,
///   demonstrating that the decoder depends only on the
///   [`TreeBuilder`] seam.
struct FixedTree(Element);

impl TreeBuilder for FixedTree {
    fn build(&self, _text: &str) -> xml::Result<Element> {
        Ok(self.0.clone())
    }
}

struct FailingTree;

impl TreeBuilder for FailingTree {
    fn build(&self, _text: &str) -> xml::Result<Element> {
        Err(xml::Error::EmptyDocument)
    }
}

#[test]
fn decodes_from_injected_tree_builder() {
    let tree = Element::new("scenario")
        .with_attr("name", "injected")
        .with_child(Node::Element(
            Element::new("send")
                .with_attr("retrans", "500")
                .with_child(Node::CData("INVITE".into())),
        ));

    let scenario = Decoder::new(FixedTree(tree))
        .decode("ignored")
        .expect("decode failed");

    assert_eq!(scenario.name, "injected");
    assert_eq!(
        scenario.steps,
        vec![Step::new(StepKind::Send)
            .with_attr("retrans", "500")
            .with_payload("INVITE")]
    );
}

#[test]
fn tree_builder_failure_is_malformed_document() {
    assert!(matches!(
        Decoder::new(FailingTree).decode("anything"),
        Err(Error::MalformedDocument(xml::Error::EmptyDocument))
    ));
}
