//! Generated protobuf code for the KServe v2 health and metadata RPCs.

#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::too_many_lines)]
tonic::include_proto!("inference");
