/*!
# AlarmRelay DevKit - Stubs and utilities for development

Library for exercising the relay pipeline without a platform or a broker:
- In-memory inventory for element, protocol and endpoint lookups
- Recording transport stub
- Raw descriptor builder
- Test harness wiring them to a pipeline
*/

pub mod descriptor_helpers;
pub mod inventory;
pub mod test_utils;
pub mod transport_stub;

pub use descriptor_helpers::DescriptorBuilder;
pub use inventory::StaticInventory;
pub use test_utils::TestHarness;
pub use transport_stub::{MockTransport, SentEnvelope};
