//! Shared test language and helpers.

use crate::genus::GenusRegistry;
use crate::model::BlockGraph;

pub(crate) const SAMPLE_LANGUAGE: &str = r#"{
  "BlockGenuses": [
    { "name": "text", "kind": "data", "color": [200, 160, 40], "initlabel": "",
      "editable-label": true, "encode-label": true,
      "BlockConnectors": [
        { "connector-kind": "plug", "connector-type": "string", "position-type": "mirror" }
      ] },
    { "name": "number", "kind": "data", "initlabel": "0", "editable-label": true,
      "BlockConnectors": [
        { "connector-kind": "plug", "connector-type": "number", "position-type": "mirror" }
      ] },
    { "name": "print", "kind": "command", "color": [60, 90, 200], "initlabel": "print",
      "BlockConnectors": [
        { "connector-kind": "socket", "connector-type": "string", "label": "value" }
      ] },
    { "name": "say", "kind": "command", "initlabel": "say",
      "BlockConnectors": [
        { "connector-kind": "socket", "connector-type": "string", "label": "value",
          "DefaultArg": { "genus-name": "text", "label": "hello" } }
      ] },
    { "name": "join", "kind": "function", "initlabel": "join",
      "BlockConnectors": [
        { "connector-kind": "plug", "connector-type": "string" },
        { "connector-kind": "socket", "connector-type": "string", "is-expandable": true, "expand-group": "items" }
      ],
      "ExpandGroups": [
        { "group-name": "items", "BlockConnectors": [
          { "connector-kind": "socket", "connector-type": "string", "is-expandable": true, "expand-group": "items" }
        ] }
      ] },
    { "name": "plus", "kind": "function", "initlabel": "+", "is-infix": true,
      "BlockConnectors": [
        { "connector-kind": "plug", "connector-type": "number" },
        { "connector-kind": "socket", "connector-type": "number", "label": "left" },
        { "connector-kind": "socket", "connector-type": "number", "label": "right" }
      ] },
    { "name": "when-start", "kind": "command", "initlabel": "when started", "is-starter": true,
      "BlockConnectors": [
        { "connector-kind": "socket", "connector-type": "cmd", "label": "do", "is-indented": true }
      ] },
    { "name": "stop", "kind": "command", "initlabel": "stop", "is-terminator": true },
    { "name": "getter", "kind": "data", "BlockConnectors": [
        { "connector-kind": "plug", "connector-type": "poly" }
      ] },
    { "name": "setter", "kind": "command", "initlabel": "set", "BlockConnectors": [
        { "connector-kind": "socket", "connector-type": "poly", "label": "to" }
      ] },
    { "name": "caller", "kind": "command", "initlabel": "call" },
    { "name": "global-var", "kind": "variable", "initlabel": "x", "editable-label": true,
      "label-unique": true, "page-label-enabled": true,
      "BlockConnectors": [
        { "connector-kind": "socket", "connector-type": "number", "label": "initial" }
      ],
      "Stubs": [
        { "stub-genus": "getter" },
        { "stub-genus": "setter", "label-prefix": "set ",
          "LangSpecProperties": [ { "key": "vm-name", "value": "set" } ] }
      ] },
    { "name": "procedure", "kind": "procedure", "initlabel": "proc", "editable-label": true,
      "label-unique": true, "page-label-enabled": true,
      "BlockConnectors": [
        { "connector-kind": "socket", "connector-type": "cmd", "label": "do" },
        { "connector-kind": "socket", "connector-type": "number", "label": "arg",
          "is-expandable": true, "expand-group": "args" }
      ],
      "ExpandGroups": [
        { "group-name": "args", "BlockConnectors": [
          { "connector-kind": "socket", "connector-type": "number", "label": "arg",
            "is-expandable": true, "expand-group": "args" }
        ] }
      ],
      "Stubs": [ { "stub-genus": "caller" } ] },
    { "name": "argument", "kind": "param", "initlabel": "a", "editable-label": true,
      "BlockConnectors": [
        { "connector-kind": "plug", "connector-type": "number" }
      ],
      "Stubs": [ { "stub-genus": "getter" } ] }
  ],
  "BlockFamilies": [["print", "say"]],
  "ObsoleteBlockGenuses": ["old-print"]
}"#;

pub(crate) fn sample_registry() -> GenusRegistry {
    GenusRegistry::from_json(SAMPLE_LANGUAGE).unwrap()
}

pub(crate) fn sample_graph() -> BlockGraph {
    BlockGraph::new(sample_registry())
}
