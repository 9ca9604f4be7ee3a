use std::time::Duration;

use devsquad_core::artifact::latest_previewable;
use devsquad_core::catalog::PERSONAS;
use devsquad_core::preview::{PreviewKind, classify};
use devsquad_core::{
    ChatStatus, ControllerBuilder, ControllerUpdate, Speaker,
    build_preview_document, segment,
};
use devsquad_test_model::{PresetResponse, TestModelProvider};
use tokio::time::timeout;

const REPLY: &str = "\
[Atlas]: Welcome aboard. Sarah, can you outline the features?
**[Sarah]**: Sure! We need a counter with a reset button.
[Marcus]: Architecture:
```mermaid
graph TD
A[Counter] --> B[Reset]
```
[Neo]: Here is the component:
```tsx
import React, { useState } from 'react';
import { Plus, RotateCcw } from 'lucide-react';

export default function App() {
  const [count, setCount] = useState(0);
  return (
    <div>
      <Plus onClick={() => setCount(count + 1)} />
      <RotateCcw onClick={() => setCount(0)} />
      <span>{count}</span>
    </div>
  );
}
```
";

#[tokio::test]
async fn test_reply_to_preview() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_turn(PresetResponse::with_text(REPLY, 16));
    let mut controller =
        ControllerBuilder::with_model_provider(model_provider).build();

    controller.send("Build a counter app").unwrap();
    let mut streamed = 0;
    let completed = loop {
        let update = timeout(Duration::from_secs(5), controller.next_update())
            .await
            .unwrap()
            .unwrap();
        if update != ControllerUpdate::Streaming {
            break update;
        }
        streamed += 1;
        let segments = segment(controller.messages()[1].content(), &PERSONAS);
        assert!(!segments.is_empty());
    };
    assert!(streamed > 1);
    assert_eq!(completed, ControllerUpdate::Completed { new_artifacts: 2 });
    assert_eq!(controller.status(), ChatStatus::Idle);

    let reply = &controller.messages()[1];
    let speakers: Vec<_> = controller
        .segments(reply)
        .into_iter()
        .map(|s| match s.speaker {
            Speaker::Persona(persona) => persona.id.to_owned(),
            other => panic!("unexpected speaker {other:?}"),
        })
        .collect();
    assert_eq!(speakers, ["leader", "pm", "architect", "engineer"]);

    let artifacts = controller.artifacts();
    assert_eq!(classify(&artifacts[0]), PreviewKind::Diagram);
    let component = latest_previewable(artifacts).unwrap();
    assert_eq!(component.language(), "tsx");

    let doc = build_preview_document(component);
    assert!(!doc.contains("import "));
    assert!(doc.contains("const { Plus, RotateCcw } = window.LucideReact;"));
    assert!(doc.contains("function App() {"));
    assert!(doc.contains("React.createElement(App)"));
}

#[test]
fn test_standalone_page_passes_through() {
    let reply = "[Neo]: Single file as requested:\n```html\n<!DOCTYPE html>\n\
                 <html><body><script>alert(1)</script></body></html>\n```";
    let artifacts = devsquad_core::artifact::extract(reply, &[]);
    assert_eq!(artifacts.len(), 1);
    assert_eq!(build_preview_document(&artifacts[0]), artifacts[0].content);
}
