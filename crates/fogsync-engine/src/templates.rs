use chrono::Utc;

/// Diagram placeholder deployed alongside the blank process.
pub const BLANK_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.2" id="Layer_1" x="0px" y="0px" viewBox="0 0 20 16" xml:space="preserve">
<path fill="#D61F33" d="M10,0L0,16h20L10,0z M11,13.908H9v-2h2V13.908z M9,10.908v-6h2v6H9z"/>
</svg>"##;

const BLANK_BPMN_TEMPLATE: &str = "<bpmn:definitions xmlns:xsi='http://www.w3.org/2001/XMLSchema-instance' xmlns:bpmn='http://www.omg.org/spec/BPMN/20100524/MODEL' xmlns:bpmndi='http://www.omg.org/spec/BPMN/20100524/DI' xmlns:dc='http://www.omg.org/spec/DD/20100524/DC' id='Definitions_1' targetNamespace='http://bpmn.io/schema/bpmn'><bpmn:process id='PROCESSID' isExecutable='true'><bpmn:startEvent id='StartEvent_1'/></bpmn:process><bpmndi:BPMNDiagram id='BPMNDiagram_1'><bpmndi:BPMNPlane id='BPMNPlane_1' bpmnElement='PROCESSID'><bpmndi:BPMNShape id='_BPMNShape_StartEvent_2' bpmnElement='StartEvent_1'><dc:Bounds x='173' y='102' width='36' height='36'/></bpmndi:BPMNShape></bpmndi:BPMNPlane></bpmndi:BPMNDiagram></bpmn:definitions>";

/// A deployable process consisting of a single start event, with a process
/// id synthesized from the current unix time. Used when the cloud sends a
/// diagram the engine (or the XML validator) rejects.
pub fn blank_bpmn() -> String {
    BLANK_BPMN_TEMPLATE.replace("PROCESSID", &format!("id_{}", Utc::now().timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_bpmn_carries_timestamped_process_id() {
        let xml = blank_bpmn();
        assert!(xml.contains("<bpmn:process id='id_"));
        assert!(!xml.contains("PROCESSID"));
        assert!(crate::bpmn::is_valid(&xml));
    }
}
