use super::ring::RingBuffer;

/// One NoC endpoint: an inbound word queue and an enable gate.
#[derive(Debug, Clone)]
pub struct Endpoint {
    index: usize,
    enabled: bool,
    inbound: RingBuffer,
}

impl Endpoint {
    fn new(index: usize, capacity: usize) -> Self {
        Self {
            index,
            enabled: false,
            inbound: RingBuffer::new(capacity),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn queue(&self) -> &RingBuffer {
        &self.inbound
    }

    pub fn queue_mut(&mut self) -> &mut RingBuffer {
        &mut self.inbound
    }

    fn reset(&mut self) {
        self.enabled = false;
        self.inbound.reset();
    }
}

/// Fixed set of endpoints sharing one queue capacity, addressed by index.
#[derive(Debug, Clone)]
pub struct EndpointBank {
    endpoints: Box<[Endpoint]>,
}

impl EndpointBank {
    pub fn new(count: usize, capacity: usize) -> Self {
        Self {
            endpoints: (0..count).map(|i| Endpoint::new(i, capacity)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, ep: usize) -> Option<&Endpoint> {
        self.endpoints.get(ep)
    }

    pub fn get_mut(&mut self, ep: usize) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(ep)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    /// Disables every endpoint and empties every queue.
    pub fn reset(&mut self) {
        self.endpoints.iter_mut().for_each(Endpoint::reset);
    }
}
